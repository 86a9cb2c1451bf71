//! Blocking HTTP client for the separation backend.

use std::time::Duration;

use reqwest::blocking::{Client, multipart::Form};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::BackendSettings;
use crate::error::ApiError;

use super::types::{SeparationRequest, SeparationResult};

/// The calls the rest of the program makes against the backend.
pub trait Backend {
    /// Upload a file for separation. One call per submission, no retry.
    fn separate(&self, request: &SeparationRequest) -> Result<SeparationResult, ApiError>;

    /// Download the raw bytes behind an absolute stem or audio URL.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

pub struct BackendClient {
    base_url: String,
    http: Client,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Backend for BackendClient {
    fn separate(&self, request: &SeparationRequest) -> Result<SeparationResult, ApiError> {
        let url = format!("{}/separate", self.base_url);

        let mut form = Form::new().file("file", &request.file)?;
        for (name, value) in request.text_fields() {
            form = form.text(name, value);
        }

        info!(
            file = %request.file.display(),
            mode = %request.mode,
            custom_stems = ?request.custom_stems,
            diarization = request.diarization,
            "sending separation request"
        );

        let response = self.http.post(&url).multipart(form).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &body));
        }

        let result: SeparationResult = serde_json::from_str(&body)?;
        info!(stems = result.stems.len(), "separation succeeded");
        Ok(result)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.http.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(error_from_response(status.as_u16(), &body));
        }
        let bytes = response.bytes()?;
        debug!(url, len = bytes.len(), "fetched audio");
        Ok(bytes.to_vec())
    }
}

/// URL of the untouched upload as served by the backend.
pub fn original_audio_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/original_audio/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Map a non-2xx response to an error, using the JSON `detail` string as the
/// message when the body has one.
pub fn error_from_response(status: u16, body: &str) -> ApiError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| d.as_str().map(str::to_string));
    ApiError::Http { status, detail }
}
