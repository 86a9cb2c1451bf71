//! Separation options chosen before submitting.

use crate::api::{SeparationMode, SeparationRequest};
use crate::config::SeparationSettings;

use super::file::SelectedFile;

/// Stems offered for custom separation, in display order.
pub const CUSTOM_STEMS: [&str; 6] = ["vocals", "guitar", "bass", "drums", "piano", "other"];

pub const NO_FILE_MESSAGE: &str = "Please select an audio file first.";
pub const NO_STEMS_MESSAGE: &str = "Please select at least one instrument for custom separation.";

#[derive(Debug, Clone, PartialEq)]
pub struct SeparationConfig {
    mode: SeparationMode,
    /// Always a subset of `CUSTOM_STEMS`, kept in `CUSTOM_STEMS` order.
    custom_stems: Vec<&'static str>,
    diarization: bool,
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self::from_settings(&SeparationSettings::default())
    }
}

impl SeparationConfig {
    /// Start from configured defaults. Unknown stem names are dropped.
    pub fn from_settings(settings: &SeparationSettings) -> Self {
        let mut config = Self {
            mode: SeparationMode::FourStem,
            custom_stems: CUSTOM_STEMS
                .iter()
                .copied()
                .filter(|stem| {
                    settings
                        .custom_stems
                        .iter()
                        .any(|s| s.trim().eq_ignore_ascii_case(stem))
                })
                .collect(),
            diarization: settings.diarization,
        };
        config.set_mode(settings.mode);
        config
    }

    pub fn mode(&self) -> SeparationMode {
        self.mode
    }

    /// Diarization as it will be requested: only with vocals in the separation.
    pub fn diarization(&self) -> bool {
        self.diarization && self.has_vocals()
    }

    /// Two- and four-stem always produce vocals; custom only when chosen.
    pub fn has_vocals(&self) -> bool {
        match self.mode {
            SeparationMode::TwoStem | SeparationMode::FourStem => true,
            SeparationMode::Custom => self.is_selected("vocals"),
        }
    }

    pub fn custom_stems(&self) -> &[&'static str] {
        &self.custom_stems
    }

    pub fn is_selected(&self, stem: &str) -> bool {
        self.custom_stems.contains(&stem)
    }

    /// Switching to custom with nothing chosen preselects vocals.
    pub fn set_mode(&mut self, mode: SeparationMode) {
        self.mode = mode;
        if mode == SeparationMode::Custom && self.custom_stems.is_empty() {
            self.custom_stems.push(CUSTOM_STEMS[0]);
        }
    }

    /// Toggle one of `CUSTOM_STEMS`. Returns false for an unknown name.
    pub fn toggle_stem(&mut self, stem: &str) -> bool {
        let Some(&known) = CUSTOM_STEMS.iter().find(|s| **s == stem) else {
            return false;
        };
        if self.is_selected(known) {
            self.custom_stems.retain(|s| *s != known);
        } else {
            self.custom_stems.push(known);
            self.custom_stems
                .sort_by_key(|s| CUSTOM_STEMS.iter().position(|c| c == s));
        }
        true
    }

    /// Ignored while the separation has no vocals to split. Returns whether
    /// the toggle took effect.
    pub fn toggle_diarization(&mut self) -> bool {
        if !self.has_vocals() {
            return false;
        }
        self.diarization = !self.diarization;
        true
    }

    /// Build the upload request, or the message to show the user instead.
    pub fn to_request(&self, file: Option<&SelectedFile>) -> Result<SeparationRequest, &'static str> {
        let file = file.ok_or(NO_FILE_MESSAGE)?;
        if self.mode == SeparationMode::Custom && self.custom_stems.is_empty() {
            return Err(NO_STEMS_MESSAGE);
        }
        Ok(SeparationRequest {
            file: file.path.clone(),
            mode: self.mode,
            custom_stems: self.custom_stems.iter().map(|s| s.to_string()).collect(),
            diarization: self.diarization(),
        })
    }
}
