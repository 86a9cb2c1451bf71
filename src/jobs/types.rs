//! Commands sent to the job thread and the events it sends back.

use std::path::PathBuf;

use crate::api::{SeparationRequest, SeparationResult};
use crate::error::ApiError;
use crate::mixer::TrackId;

#[derive(Debug)]
pub enum JobCmd {
    /// Upload a file for separation. `serial` is echoed back so a result for
    /// an abandoned submission can be told apart.
    Separate { serial: u64, request: SeparationRequest },
    /// Download the audio behind `url` for the track `id`.
    Fetch { id: TrackId, url: String },
    /// Download `url` and write it to `dest`.
    Save { url: String, dest: PathBuf },
    /// Stop the job thread after the current job.
    Quit,
}

#[derive(Debug)]
pub enum JobEvent {
    Separated {
        serial: u64,
        result: Result<SeparationResult, ApiError>,
    },
    Fetched {
        id: TrackId,
        result: Result<Vec<u8>, ApiError>,
    },
    Saved(Result<PathBuf, ApiError>),
}
