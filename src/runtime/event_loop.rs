use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::layout::Rect;
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, warn};

use crate::api::SeparationMode;
use crate::app::{App, Screen};
use crate::audio::AudioOutput;
use crate::config;
use crate::jobs::{JobCmd, JobEvent, JobRunner};
use crate::mixer::MediaHandle;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::runtime::mpris_sync::update_mpris;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Area of the last drawn frame, for mouse hit-testing.
    frame_area: Rect,
    /// A timeline drag started inside the seek bar.
    dragging: bool,
}

/// Main terminal event loop: applies job results, advances the transport,
/// draws, and handles input from the terminal and MPRIS. Returns `Ok(())`
/// when shutdown is requested.
#[allow(clippy::too_many_arguments)]
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    audio: &AudioOutput,
    jobs: &JobRunner,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick = Duration::from_millis(settings.ui.tick_ms);

    loop {
        while let Some(ev) = jobs.try_recv() {
            handle_job_event(ev, app, audio, jobs);
        }

        if let Some(mixer) = app.mixer.as_mut() {
            mixer.poll_reference();
        }

        // Position moves every tick, so MPRIS gets a fresh snapshot each time.
        update_mpris(mpris, app);

        state.frame_area = terminal.draw(|f| ui::draw(f, app, settings))?.area;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, app) {
                return Ok(());
            }
        }

        if event::poll(tick)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key_event(key, settings, app, jobs) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => handle_mouse_event(mouse, app, state),
                _ => {}
            }
        }
    }
}

fn send(jobs: &JobRunner, cmd: JobCmd) {
    if let Err(e) = jobs.send(cmd) {
        warn!(%e, "job thread is gone");
    }
}

fn handle_job_event(ev: JobEvent, app: &mut App, audio: &AudioOutput, jobs: &JobRunner) {
    match ev {
        JobEvent::Separated { serial, result } => {
            for cmd in app.on_separated(serial, result) {
                send(jobs, cmd);
            }
        }
        JobEvent::Fetched { id, result } => {
            app.on_fetched(id, result, |bytes| {
                audio
                    .handle(bytes)
                    .map(|h| Box::new(h) as Box<dyn MediaHandle>)
            });
        }
        JobEvent::Saved(result) => app.on_saved(result),
    }
}

fn handle_control_cmd(cmd: ControlCmd, app: &mut App) -> bool {
    debug!(?cmd, "mpris command");
    if cmd == ControlCmd::Quit {
        return true;
    }
    let Some(mixer) = app.mixer.as_mut() else {
        return false;
    };
    match cmd {
        ControlCmd::Play => mixer.play(),
        ControlCmd::Pause => mixer.pause(),
        ControlCmd::PlayPause => mixer.toggle_play(),
        ControlCmd::Stop => mixer.reset(),
        ControlCmd::SeekBy(delta) => mixer.seek_by(delta),
        ControlCmd::SeekTo(seconds) => mixer.seek(seconds),
        ControlCmd::Quit => {}
    }
    false
}

fn handle_mouse_event(mouse: MouseEvent, app: &mut App, state: &mut EventLoopState) {
    let fraction = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) | MouseEventKind::Drag(MouseButton::Left) => {
            ui::seek_fraction_at(state.frame_area, app, mouse.column, mouse.row)
        }
        _ => None,
    };

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let (Some(f), Some(mixer)) = (fraction, app.mixer.as_mut()) {
                mixer.begin_drag();
                mixer.seek_fraction(f);
                state.dragging = true;
            }
        }
        MouseEventKind::Drag(MouseButton::Left) if state.dragging => {
            if let (Some(f), Some(mixer)) = (fraction, app.mixer.as_mut()) {
                mixer.seek_fraction(f);
            }
        }
        MouseEventKind::Up(MouseButton::Left) if state.dragging => {
            state.dragging = false;
            if let Some(mixer) = app.mixer.as_mut() {
                mixer.end_drag();
            }
        }
        _ => {}
    }
}

/// Returns `true` when the app should quit.
fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    jobs: &JobRunner,
) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if let Some(input) = app.path_input.as_mut() {
        match key.code {
            KeyCode::Esc => app.path_input = None,
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Enter => {
                let path = input.trim().to_string();
                app.path_input = None;
                if !path.is_empty() {
                    app.select_file(Path::new(&path));
                }
            }
            KeyCode::Char(c) if !c.is_control() => input.push(c),
            _ => {}
        }
        return false;
    }

    if key.code == KeyCode::Char('q') {
        return true;
    }

    match app.screen() {
        Screen::Config => handle_config_key(key, app, jobs),
        Screen::Processing => {
            if matches!(key.code, KeyCode::Char('n') | KeyCode::Esc) {
                app.process_another();
            }
        }
        Screen::Results => handle_results_key(key, settings, app, jobs),
    }
    false
}

fn handle_config_key(key: KeyEvent, app: &mut App, jobs: &JobRunner) {
    match key.code {
        KeyCode::Char('o') => app.path_input = Some(String::new()),
        KeyCode::Char('2') => app.set_mode(SeparationMode::TwoStem),
        KeyCode::Char('4') => app.set_mode(SeparationMode::FourStem),
        KeyCode::Char('c') => app.set_mode(SeparationMode::Custom),
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1),
        KeyCode::Char('x') | KeyCode::Char(' ') => app.toggle_stem_at_cursor(),
        KeyCode::Char('d') => app.toggle_diarization(),
        KeyCode::Enter => {
            if let Some(cmd) = app.start_processing() {
                send(jobs, cmd);
            }
        }
        _ => {}
    }
}

fn handle_results_key(key: KeyEvent, settings: &config::Settings, app: &mut App, jobs: &JobRunner) {
    let controls = &settings.controls;

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1),
        KeyCode::Char('n') => app.process_another(),
        KeyCode::Char('w') => {
            if let Some(cmd) = app.save_selected(&settings.downloads.dir) {
                send(jobs, cmd);
            }
        }
        _ => mixer_key(key, controls, app),
    }
}

fn mixer_key(key: KeyEvent, controls: &config::ControlsSettings, app: &mut App) {
    let selected = app.selected_track().map(|t| (t.id, i32::from(t.volume)));
    let Some(mixer) = app.mixer.as_mut() else {
        return;
    };
    let step = i32::from(controls.volume_step);
    let seek = controls.seek_seconds as f64;

    match key.code {
        KeyCode::Char(' ') | KeyCode::Char('p') => mixer.toggle_play(),
        KeyCode::Char('h') | KeyCode::Left => mixer.seek_by(-seek),
        KeyCode::Char('l') | KeyCode::Right => mixer.seek_by(seek),
        KeyCode::Char('r') => mixer.reset(),
        KeyCode::Char('m') => {
            if let Some((id, _)) = selected {
                mixer.toggle_mute(id);
            }
        }
        KeyCode::Char('s') => {
            if let Some((id, _)) = selected {
                mixer.toggle_solo(id);
            }
        }
        KeyCode::Char('-') => {
            if let Some((id, volume)) = selected {
                mixer.set_volume(id, volume - step);
            }
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            if let Some((id, volume)) = selected {
                mixer.set_volume(id, volume + step);
            }
        }
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            if let Some(&speed) = controls.speed_presets.get(index) {
                mixer.set_speed(speed);
            }
        }
        _ => {}
    }
}
