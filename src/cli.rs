//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::api::SeparationMode;
use crate::config::Settings;

/// stemdeck - split a song into stems on a separation server and mix them in
/// the terminal.
#[derive(Parser, Debug)]
#[command(name = "stemdeck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Audio file to select on startup
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Base URL of the separation backend
    #[arg(long, value_name = "URL", env = "STEMDECK_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Separation mode: 2-stem, 4-stem or custom
    #[arg(short, long, value_name = "MODE")]
    pub mode: Option<SeparationMode>,

    /// Stem to separate in custom mode (repeatable)
    #[arg(long = "stem", value_name = "STEM")]
    #[arg(value_parser = ["vocals", "guitar", "bass", "drums", "piano", "other"])]
    pub stems: Vec<String>,

    /// Split the vocals per speaker
    #[arg(long, default_value = "false")]
    pub diarize: bool,

    /// Start separating FILE right away
    #[arg(long, default_value = "false", requires = "file")]
    pub process: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long, default_value = "false")]
    pub print_config: bool,

    /// Verbose logging: -v for debug, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log filter implied by `-v`, if any was given.
    pub fn log_filter(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }

    /// Layer command line values over loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(url) = &self.backend_url {
            settings.backend.base_url = url.clone();
        }
        if let Some(mode) = self.mode {
            settings.separation.mode = mode;
        }
        if !self.stems.is_empty() {
            settings.separation.custom_stems = self.stems.clone();
            if self.mode.is_none() {
                settings.separation.mode = SeparationMode::Custom;
            }
        }
        if self.diarize {
            settings.separation.diarization = true;
        }
    }
}
