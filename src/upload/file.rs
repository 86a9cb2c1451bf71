//! Validation of the file picked for upload.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::file::FileType;
use lofty::prelude::*;
use lofty::probe::Probe;
use tracing::{debug, warn};

use crate::config::UploadSettings;
use crate::error::UploadError;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// An audio file that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    /// Container detected from the file content, when recognizable.
    pub format: Option<&'static str>,
    /// Read from the container headers; `None` when lofty can not tell.
    pub duration: Option<Duration>,
}

impl SelectedFile {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / BYTES_PER_MB
    }
}

/// Check that `path` is an uploadable audio file.
///
/// Type detection looks at the content first. The configured extensions are a
/// fallback for files lofty can not identify.
pub fn select_file(path: &Path, settings: &UploadSettings) -> Result<SelectedFile, UploadError> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(UploadError::NotFound(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    if !meta.is_file() {
        return Err(UploadError::NotAFile(path.to_path_buf()));
    }

    let format = detect_format(path);
    if format.is_none() && !has_allowed_extension(path, &settings.extensions) {
        warn!(path = %path.display(), "rejected file with unsupported type");
        return Err(UploadError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let size_bytes = meta.len();
    let size_mb = size_bytes as f64 / BYTES_PER_MB;
    if size_bytes > settings.max_file_mb.saturating_mul(1024 * 1024) {
        return Err(UploadError::TooLarge {
            size_mb,
            max_mb: settings.max_file_mb,
        });
    }

    let duration = read_duration(path);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!(file = %name, size_bytes, ?format, ?duration, "selected file");
    Ok(SelectedFile {
        path: path.to_path_buf(),
        name,
        size_bytes,
        format,
        duration,
    })
}

/// Accepted container name for the file content, if lofty recognizes it.
fn detect_format(path: &Path) -> Option<&'static str> {
    let probe = Probe::open(path).ok()?.guess_file_type().ok()?;
    match probe.file_type()? {
        FileType::Mpeg => Some("MP3"),
        FileType::Wav => Some("WAV"),
        FileType::Flac => Some("FLAC"),
        FileType::Vorbis => Some("OGG"),
        _ => None,
    }
}

fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}

fn read_duration(path: &Path) -> Option<Duration> {
    let tagged = lofty::read_from_path(path).ok()?;
    Some(tagged.properties().duration()).filter(|d| !d.is_zero())
}
