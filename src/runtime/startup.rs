use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::cli::Cli;
use crate::config::{self, Settings};
use crate::jobs::JobRunner;

/// Send tracing output to the log file; the terminal belongs to the UI.
///
/// Returns the file in use, or `None` when logging is disabled because the
/// file could not be opened.
pub fn init_logging(cli: &Cli, settings: &Settings) -> Option<PathBuf> {
    let path = settings
        .log
        .file
        .clone()
        .or_else(config::default_log_path)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;

    let fallback = cli.log_filter().unwrap_or(settings.log.filter.as_str());
    let filter = EnvFilter::try_from_env("STEMDECK_LOG")
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .ok()?;

    Some(path)
}

/// Select the file named on the command line and, with `--process`, submit it.
pub fn apply_cli(app: &mut App, cli: &Cli, jobs: &JobRunner) {
    let Some(file) = &cli.file else {
        return;
    };
    app.select_file(file);

    if cli.process && app.file.is_some() {
        if let Some(cmd) = app.start_processing() {
            if let Err(e) = jobs.send(cmd) {
                warn!(%e, "job thread is gone");
            }
        }
    }
}
