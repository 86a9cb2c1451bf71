use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::api::SeparationMode;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/stemdeck/config.toml` or `~/.config/stemdeck/config.toml`
///
/// Precedence (highest wins):
/// 1) Command line flags (applied by the runtime after loading)
/// 2) Environment variables (prefix `STEMDECK__`, `__` as nested separator)
/// 3) Config file (if present)
/// 4) Struct defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendSettings,
    pub upload: UploadSettings,
    pub separation: SeparationSettings,
    pub controls: ControlsSettings,
    pub ui: UiSettings,
    pub log: LogSettings,
    pub downloads: DownloadSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Root URL of the separation service, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Whole-request timeout. Separation of a long track can take minutes.
    pub request_timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Largest file accepted for upload, in MiB.
    pub max_file_mb: u64,
    /// Extensions accepted when the content type can not be detected
    /// (case-insensitive, without dot).
    pub extensions: Vec<String>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_file_mb: 150,
            extensions: vec!["mp3".into(), "wav".into(), "ogg".into(), "flac".into()],
        }
    }
}

/// Separation options the config screen starts with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationSettings {
    pub mode: SeparationMode,
    /// Preselected stems for custom mode.
    ///
    /// Example: ["vocals", "piano"]
    pub custom_stems: Vec<String>,
    pub diarization: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to seek when pressing `h` / `l`.
    pub seek_seconds: u64,
    /// Volume change in percent for `-` / `+`.
    pub volume_step: u8,
    /// Speed multipliers bound to `1`..`9`, in order.
    pub speed_presets: Vec<f32>,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            seek_seconds: 5,
            volume_step: 5,
            speed_presets: vec![0.5, 1.0, 2.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Redraw and poll interval (milliseconds).
    pub tick_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " stemdeck ~ split it, mix it ".to_string(),
            tick_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing` filter directive used when `STEMDECK_LOG` is unset.
    pub filter: String,
    /// Log file. Defaults to `$XDG_STATE_HOME/stemdeck/stemdeck.log`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Directory saved stems are written to.
    pub dir: PathBuf,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}
