//! Application model types: `App`, `Screen` and `PlaybackState`.
//!
//! The `App` struct holds the selected file, separation options, the
//! in-flight request and the mixer built from its result. Handlers return the
//! background jobs they want run instead of touching the network themselves.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::api::{SeparationMode, SeparationResult, original_audio_url};
use crate::config::{Settings, UploadSettings};
use crate::error::{ApiError, MediaError};
use crate::jobs::JobCmd;
use crate::mixer::{MediaHandle, Mixer, Track, TrackId, TrackKind};
use crate::upload::{CUSTOM_STEMS, SelectedFile, SeparationConfig, select_file};

pub const EMPTY_RESULT_MESSAGE: &str = "No audio results available to display.";
pub const DIARIZATION_NEEDS_VOCALS: &str = "Diarization requires vocals to be selected.";

/// The playback state of the application, as reported over MPRIS.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Pick a file and separation options.
    Config,
    /// Waiting for the backend.
    Processing,
    /// The mixer, or the empty-result message.
    Results,
}

/// The main application model.
pub struct App {
    pub file: Option<SelectedFile>,
    pub separation: SeparationConfig,
    upload: UploadSettings,
    base_url: String,

    /// A separation request is outstanding.
    pub api_loading: bool,
    /// Serial of the submission whose result is still wanted.
    serial: u64,
    pub result: Option<SeparationResult>,
    pub mixer: Option<Mixer>,

    /// The single user-visible error message.
    pub error: Option<String>,
    /// Transient one-line status (downloads, ignored inputs).
    pub status: Option<String>,

    /// Path being typed, when the open prompt is active.
    pub path_input: Option<String>,
    /// Cursor over `CUSTOM_STEMS` on the config screen.
    pub stem_cursor: usize,
    /// Cursor over the mixer tracks on the results screen.
    pub track_cursor: usize,
}

impl App {
    pub fn new(settings: &Settings) -> Self {
        Self {
            file: None,
            separation: SeparationConfig::from_settings(&settings.separation),
            upload: settings.upload.clone(),
            base_url: settings.backend.base_url.trim_end_matches('/').to_string(),
            api_loading: false,
            serial: 0,
            result: None,
            mixer: None,
            error: None,
            status: None,
            path_input: None,
            stem_cursor: 0,
            track_cursor: 0,
        }
    }

    pub fn screen(&self) -> Screen {
        if self.api_loading {
            Screen::Processing
        } else if self.result.is_some() {
            Screen::Results
        } else {
            Screen::Config
        }
    }

    #[cfg(test)]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Drop the result, its tracks and any error. Handles go with the mixer.
    fn discard_outcome(&mut self) {
        self.result = None;
        self.mixer = None;
        self.error = None;
        self.track_cursor = 0;
    }

    /// Validate and select `path`. Any previous result is discarded either way.
    pub fn select_file(&mut self, path: &Path) {
        if self.api_loading {
            return;
        }
        self.discard_outcome();
        match select_file(path, &self.upload) {
            Ok(file) => {
                info!(file = %file.name, size_mb = file.size_mb(), "file selected");
                self.file = Some(file);
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "file rejected");
                self.file = None;
                self.error = Some(err.to_string());
            }
        }
    }

    pub fn set_mode(&mut self, mode: SeparationMode) {
        if self.api_loading || self.separation.mode() == mode {
            return;
        }
        self.discard_outcome();
        self.separation.set_mode(mode);
    }

    /// Toggle the custom stem under the cursor.
    pub fn toggle_stem_at_cursor(&mut self) {
        if self.api_loading || self.separation.mode() != SeparationMode::Custom {
            return;
        }
        let Some(stem) = CUSTOM_STEMS.get(self.stem_cursor) else {
            return;
        };
        self.discard_outcome();
        self.separation.toggle_stem(stem);
    }

    pub fn toggle_diarization(&mut self) {
        if self.api_loading {
            return;
        }
        if !self.separation.has_vocals() {
            self.status = Some(DIARIZATION_NEEDS_VOCALS.to_string());
            return;
        }
        self.discard_outcome();
        self.separation.toggle_diarization();
    }

    pub fn move_cursor(&mut self, delta: isize) {
        match self.screen() {
            Screen::Config => {
                self.stem_cursor = step(self.stem_cursor, delta, CUSTOM_STEMS.len());
            }
            Screen::Results => {
                let len = self.mixer.as_ref().map_or(0, |m| m.tracks().len());
                self.track_cursor = step(self.track_cursor, delta, len);
            }
            Screen::Processing => {}
        }
    }

    /// Submit the current file and options. Refused while a request is in flight.
    pub fn start_processing(&mut self) -> Option<JobCmd> {
        if self.api_loading {
            self.status = Some("Separation already in progress.".to_string());
            return None;
        }
        match self.separation.to_request(self.file.as_ref()) {
            Ok(request) => {
                self.discard_outcome();
                self.api_loading = true;
                self.serial += 1;
                info!(serial = self.serial, mode = %request.mode, "submitting separation");
                Some(JobCmd::Separate {
                    serial: self.serial,
                    request,
                })
            }
            Err(message) => {
                self.error = Some(message.to_string());
                None
            }
        }
    }

    /// Handle a finished separation. Returns the fetches for the new tracks.
    pub fn on_separated(
        &mut self,
        serial: u64,
        result: Result<SeparationResult, ApiError>,
    ) -> Vec<JobCmd> {
        if serial != self.serial || !self.api_loading {
            info!(serial, "ignoring result of abandoned separation");
            return Vec::new();
        }
        self.api_loading = false;

        match result {
            Ok(result) => {
                let mixer = Mixer::new(&result, &self.base_url);
                let fetches = mixer
                    .tracks()
                    .iter()
                    .map(|t| JobCmd::Fetch {
                        id: t.id,
                        url: t.source_url.clone(),
                    })
                    .collect();
                info!(tracks = mixer.tracks().len(), "separation result ready");
                self.mixer = (!mixer.is_empty()).then_some(mixer);
                self.result = Some(result);
                self.track_cursor = 0;
                fetches
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Vec::new()
            }
        }
    }

    /// Attach downloaded audio to its track. Results for tracks that are no
    /// longer part of the mixer are dropped.
    pub fn on_fetched<F>(&mut self, id: TrackId, result: Result<Vec<u8>, ApiError>, make_handle: F)
    where
        F: FnOnce(Vec<u8>) -> Result<Box<dyn MediaHandle>, MediaError>,
    {
        let Some(mixer) = self.mixer.as_mut() else {
            return;
        };
        let Some(name) = mixer.track(id).map(|t| t.name.clone()) else {
            return;
        };

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(track = %name, %err, "track will stay silent");
                return;
            }
        };
        match make_handle(bytes) {
            Ok(handle) => {
                mixer.attach(id, handle);
            }
            Err(err) => warn!(track = %name, %err, "track will stay silent"),
        }
    }

    /// Go back to the config screen, keeping the file and options. A pending
    /// result is abandoned.
    pub fn process_another(&mut self) {
        if self.api_loading {
            self.api_loading = false;
            info!(serial = self.serial, "abandoned separation");
        }
        self.discard_outcome();
        self.status = None;
    }

    /// Tracks in the order the results screen lists them. `track_cursor`
    /// indexes into this.
    pub fn display_tracks(&self) -> Vec<&Track> {
        let (mut artists, instruments) = self.grouped_tracks();
        artists.extend(instruments);
        artists
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.display_tracks().get(self.track_cursor).copied()
    }

    /// Save the track under the cursor into `dir`.
    pub fn save_selected(&mut self, dir: &Path) -> Option<JobCmd> {
        let track = self.selected_track()?;
        let dest: PathBuf = dir.join(track.file_name());
        let url = track.source_url.clone();
        let message = format!("Saving {} ...", track.name);
        self.status = Some(message);
        Some(JobCmd::Save { url, dest })
    }

    pub fn on_saved(&mut self, result: Result<PathBuf, ApiError>) {
        self.status = Some(match result {
            Ok(path) => format!("Saved {}", path.display()),
            Err(err) => format!("Save failed: {err}"),
        });
    }

    /// URL of the untouched upload, when the backend returned one.
    pub fn original_audio_url(&self) -> Option<String> {
        let path = self.result.as_ref()?.original_audio_path.as_deref()?;
        (!path.is_empty()).then(|| original_audio_url(&self.base_url, path))
    }

    /// Artist and stem tracks in display groups: artists first, then instruments.
    pub fn grouped_tracks(&self) -> (Vec<&Track>, Vec<&Track>) {
        let Some(mixer) = self.mixer.as_ref() else {
            return (Vec::new(), Vec::new());
        };
        mixer
            .tracks()
            .iter()
            .partition(|t| t.kind == TrackKind::Artist)
    }

    pub fn playback_state(&self) -> PlaybackState {
        match self.mixer.as_ref() {
            None => PlaybackState::Stopped,
            Some(m) if m.transport().playing => PlaybackState::Playing,
            Some(_) => PlaybackState::Paused,
        }
    }

    /// Title reported to MPRIS: the selected file name.
    pub fn title(&self) -> Option<&str> {
        self.file.as_ref().map(|f| f.name.as_str())
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}
