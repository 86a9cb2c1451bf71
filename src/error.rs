//! Error types for stemdeck.
//!
//! Error strategy:
//! - Media handle errors: recovered per track, logged, siblings unaffected
//! - Upload/API errors: surfaced to the user as a single message
//! - Startup errors (bad CLI config, audio output, terminal): abort the program

use std::path::PathBuf;

use thiserror::Error;

/// Audio formats accepted for upload, for user-facing messages.
pub const SUPPORTED_FORMATS: &str = "MP3, WAV, OGG, FLAC";

/// Errors returned by the separation backend client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response. `detail` comes from a JSON `detail` field when present.
    #[error("{}", http_message(.status, .detail))]
    Http { status: u16, detail: Option<String> },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("could not decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("file error: {0}")]
    File(#[from] std::io::Error),
}

fn http_message(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(d) if !d.trim().is_empty() => d.clone(),
        _ => format!("HTTP error {status}"),
    }
}

/// Errors raised by a single playback handle.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("could not decode audio: {0}")]
    Decode(String),

    #[error("seek failed: {0}")]
    Seek(String),

    #[error("invalid playback rate {0}")]
    InvalidRate(f32),
}

/// Errors from validating the file picked for upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File not found: '{0}'")]
    NotFound(PathBuf),

    #[error("Not a regular file: '{0}'")]
    NotAFile(PathBuf),

    #[error("Invalid file type for '{path}'. Please upload an audio file ({SUPPORTED_FORMATS})")]
    UnsupportedFormat { path: PathBuf },

    #[error("File too large: {size_mb:.2} MB. Maximum file size is {max_mb}MB")]
    TooLarge { size_mb: f64, max_mb: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level errors that stop the program.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no audio output device: {0}")]
    AudioOutput(String),

    #[error("could not build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
