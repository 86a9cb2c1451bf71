use std::sync::mpsc;

use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::api::BackendClient;
use crate::app::App;
use crate::audio::AudioOutput;
use crate::cli::Cli;
use crate::error::Error;
use crate::jobs::JobRunner;
use crate::mpris::ControlCmd;

mod event_loop;
mod mpris_sync;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (mut settings, config_warning) = settings::load_settings();
    cli.apply(&mut settings);
    settings.validate().map_err(Error::InvalidConfig)?;

    if cli.print_config {
        print!("{}", toml::to_string_pretty(&settings)?);
        return Ok(());
    }

    let log_path = startup::init_logging(&cli, &settings);
    if let Some(warning) = config_warning {
        warn!("{warning}");
    }
    info!(backend = %settings.backend.base_url, log = ?log_path, "starting stemdeck");

    let audio = AudioOutput::open()?;
    let backend = BackendClient::new(&settings.backend).map_err(Error::HttpClient)?;
    let jobs = JobRunner::new(backend);

    let mut app = App::new(&settings);
    startup::apply_cli(&mut app, &cli, &jobs);

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::default();
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        &audio,
        &jobs,
        &mpris,
        &control_rx,
        &mut state,
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // A separation can block the job thread for minutes; only wait for short jobs.
    if !app.api_loading {
        jobs.shutdown();
    }
    info!("stemdeck exiting");

    run_result
}
