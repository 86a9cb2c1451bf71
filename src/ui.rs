//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`, and the
//! layout math the event loop uses to map mouse positions to seek targets.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};

use crate::api::SeparationMode;
use crate::app::{App, EMPTY_RESULT_MESSAGE, Screen};
use crate::config::{ControlsSettings, Settings};
use crate::mixer::{self, Mixer, Track, TrackId, WAVEFORM_BARS};
use crate::upload::CUSTOM_STEMS;

/// Columns left of a lane's waveform: cursor, name, badges and volume.
const LANE_LABEL_WIDTH: u16 = 34;
const NAME_WIDTH: usize = 18;
const BAR_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const UNPLAYED: Color = Color::DarkGray;

fn padded() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

/// Render the controls help text for the current screen.
fn controls_text(app: &App, controls: &ControlsSettings) -> String {
    if app.path_input.is_some() {
        return "[enter] select file | [esc] cancel".to_string();
    }
    let keys: Vec<String> = match app.screen() {
        Screen::Config => vec![
            "[o] open file".into(),
            "[2/4/c] mode".into(),
            "[j/k] move".into(),
            "[x] toggle stem".into(),
            "[d] diarization".into(),
            "[enter] separate".into(),
            "[q] quit".into(),
        ],
        Screen::Processing => vec!["[n] cancel".into(), "[q] quit".into()],
        Screen::Results => vec![
            "[space/p] play/pause".into(),
            format!("[h/l] seek -/+{}s", controls.seek_seconds),
            "[j/k] track".into(),
            "[m] mute".into(),
            "[s] solo".into(),
            format!("[-/+] volume {}%", controls.volume_step),
            format!("[1-{}] speed", controls.speed_presets.len().min(9)),
            "[r] reset".into(),
            "[w] save stem".into(),
            "[n] process another".into(),
            "[q] quit".into(),
        ],
    };
    keys.join(" | ")
}

fn track_color(track: &Track) -> Color {
    let c = track.color;
    Color::Rgb((c >> 16) as u8, (c >> 8) as u8, c as u8)
}

/// The four horizontal bands of every screen.
fn frame_areas(area: Rect) -> [Rect; 4] {
    Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(4),
    ])
    .areas(area)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaneRow {
    Header(&'static str, Rect),
    Track { id: TrackId, index: usize, area: Rect },
}

/// Where the pieces of the results screen go.
struct ResultsAreas {
    timeline: Rect,
    timeline_inner: Rect,
    transport: Rect,
    lanes: Rect,
    rows: Vec<LaneRow>,
    diarization: Rect,
}

fn results_areas(main: Rect, app: &App, mixer: &Mixer) -> ResultsAreas {
    let diarization_height = if diarization_shown(app) { 6 } else { 0 };
    let [timeline, transport, lanes, diarization] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(diarization_height),
    ])
    .areas(main);

    let timeline_inner = Block::bordered().inner(timeline);
    let inner = Block::bordered().inner(lanes);

    let (artists, instruments) = app.grouped_tracks();
    let mut rows = Vec::new();
    let mut y = inner.y;
    for (title, group) in [("Individual Artists", artists), ("Instruments", instruments)] {
        if group.is_empty() {
            continue;
        }
        if y >= inner.bottom() {
            break;
        }
        rows.push(LaneRow::Header(title, Rect::new(inner.x, y, inner.width, 1)));
        y += 1;
        for track in group {
            if y >= inner.bottom() {
                break;
            }
            let index = mixer
                .tracks()
                .iter()
                .position(|t| t.id == track.id)
                .unwrap_or(0);
            rows.push(LaneRow::Track {
                id: track.id,
                index,
                area: Rect::new(inner.x, y, inner.width, 1),
            });
            y += 1;
        }
    }

    ResultsAreas {
        timeline,
        timeline_inner,
        transport,
        lanes,
        rows,
        diarization,
    }
}

fn waveform_area(lane: Rect) -> Rect {
    let offset = LANE_LABEL_WIDTH.min(lane.width);
    Rect::new(lane.x + offset, lane.y, lane.width - offset, lane.height)
}

fn diarization_shown(app: &App) -> bool {
    app.result
        .as_ref()
        .and_then(|r| r.diarization.as_ref())
        .is_some_and(|d| d.enabled)
}

/// Fraction of the duration under the mouse, when it is over the timeline or
/// a lane's waveform on the results screen.
pub fn seek_fraction_at(area: Rect, app: &App, column: u16, row: u16) -> Option<f64> {
    if app.screen() != Screen::Results {
        return None;
    }
    let mixer = app.mixer.as_ref()?;
    let [_, _, main, _] = frame_areas(area);
    let areas = results_areas(main, app, mixer);
    let point = Position::new(column, row);

    let target = std::iter::once(areas.timeline_inner)
        .chain(areas.rows.iter().filter_map(|r| match r {
            LaneRow::Track { area, .. } => Some(waveform_area(*area)),
            LaneRow::Header(..) => None,
        }))
        .find(|r| r.width > 0 && r.contains(point))?;

    Some(mixer::timeline_fraction(
        f64::from(column - target.x),
        f64::from(target.width),
    ))
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(frame: &mut Frame, app: &App, settings: &Settings) {
    let [header_area, status_area, main, footer_area] = frame_areas(frame.area());

    let header = Paragraph::new(settings.ui.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" stemdeck ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, header_area);

    draw_status(frame, app, status_area);

    match app.screen() {
        Screen::Config => draw_config(frame, app, main),
        Screen::Processing => draw_processing(frame, app, main),
        Screen::Results => draw_results(frame, app, settings, main),
    }

    let footer = Paragraph::new(controls_text(app, &settings.controls))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(padded()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, footer_area);
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(err) = &app.error {
        Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)))
    } else if let Some(status) = &app.status {
        Line::from(status.clone())
    } else {
        let mut parts = Vec::new();
        match &app.file {
            Some(f) => parts.push(format!("File: {}", f.name)),
            None => parts.push("No file selected".to_string()),
        }
        parts.push(format!("Mode: {}", app.separation.mode()));
        if let Some(url) = app.original_audio_url() {
            parts.push(format!("Original: {url}"));
        }
        Line::from(parts.join(" • "))
    };

    let status = Paragraph::new(line)
        .block(Block::bordered().padding(padded()).title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, area);
}

fn draw_config(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    if let Some(input) = &app.path_input {
        lines.push(Line::from(vec![
            Span::raw("Open: ").bold(),
            Span::raw(input.clone()),
            Span::raw("_").slow_blink(),
        ]));
    } else {
        match &app.file {
            Some(f) => {
                let mut text = format!("File: {} ({:.2} MB", f.name, f.size_mb());
                if let Some(format) = f.format {
                    text.push_str(&format!(", {format}"));
                }
                if let Some(d) = f.duration {
                    text.push_str(&format!(", {}", mixer::format_time(d.as_secs_f64())));
                }
                text.push(')');
                lines.push(Line::from(text));
            }
            None => lines.push(Line::from("File: none (press o to open an audio file)")),
        }
    }
    lines.push(Line::default());

    lines.push(Line::from("Separation mode").bold());
    for (key, mode) in [
        ('2', SeparationMode::TwoStem),
        ('4', SeparationMode::FourStem),
        ('c', SeparationMode::Custom),
    ] {
        let selected = app.separation.mode() == mode;
        let marker = if selected { "●" } else { "○" };
        let text = format!("  [{key}] {marker} {:<7} {}", mode.as_str(), mode.label());
        let style = if selected {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::styled(text, style));
    }

    if app.separation.mode() == SeparationMode::Custom {
        lines.push(Line::default());
        lines.push(Line::from("Instruments").bold());
        for (i, stem) in CUSTOM_STEMS.iter().enumerate() {
            let check = if app.separation.is_selected(stem) { "x" } else { " " };
            let cursor = if i == app.stem_cursor { ">" } else { " " };
            let line = Line::from(format!("  {cursor} [{check}] {stem}"));
            lines.push(if i == app.stem_cursor {
                line.reversed()
            } else {
                line
            });
        }
    }

    lines.push(Line::default());
    if app.separation.has_vocals() {
        let diarization = if app.separation.diarization() { "on" } else { "off" };
        lines.push(Line::from(format!("[d] Speaker diarization: {diarization}")));
    } else {
        lines.push(Line::from("[d] Speaker diarization: requires vocals to be selected").dim());
    }
    lines.push(Line::default());
    lines.push(Line::from("Press Enter to separate.").italic());

    let body = Paragraph::new(lines)
        .block(Block::bordered().padding(padded()).title(" separate "))
        .wrap(Wrap { trim: false });
    frame.render_widget(body, area);
}

fn draw_processing(frame: &mut Frame, app: &App, area: Rect) {
    let name = app.file.as_ref().map_or("file", |f| f.name.as_str());
    let lines = vec![
        Line::default(),
        Line::from(format!("Separating {name} ({})...", app.separation.mode())).bold(),
        Line::from("This can take a few minutes for long tracks."),
    ];
    let body = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::bordered().title(" processing "));
    frame.render_widget(body, area);
}

fn draw_results(frame: &mut Frame, app: &App, settings: &Settings, area: Rect) {
    let Some(mixer) = app.mixer.as_ref() else {
        let text = if app.result.as_ref().is_some_and(|r| r.is_empty()) {
            EMPTY_RESULT_MESSAGE.to_string()
        } else {
            app.original_audio_url()
                .map(|url| format!("No stems returned. Original audio: {url}"))
                .unwrap_or_else(|| EMPTY_RESULT_MESSAGE.to_string())
        };
        let body = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::bordered().title(" results "));
        frame.render_widget(body, area);
        return;
    };

    let areas = results_areas(area, app, mixer);
    let transport = mixer.transport();
    let progress = mixer.progress_percent();

    // Timeline
    let title = format!(
        " {} / {} ",
        mixer::format_time(mixer.position_secs()),
        mixer::format_time(mixer.duration_secs())
    );
    let width = usize::from(areas.timeline_inner.width);
    let played = ((progress / 100.0) * width as f64).round() as usize;
    let bar = Line::from(vec![
        Span::styled("━".repeat(played), Style::default().fg(Color::Cyan)),
        Span::styled("─".repeat(width.saturating_sub(played)), Style::default().fg(UNPLAYED)),
    ]);
    frame.render_widget(
        Paragraph::new(bar).block(Block::bordered().title(" timeline ").title(title)),
        areas.timeline,
    );

    // Transport
    let mut spans = vec![if transport.playing {
        Span::styled("▶ Playing", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        Span::raw("⏸ Paused").bold()
    }];
    spans.push(Span::raw("   Speed: "));
    for (i, preset) in settings.controls.speed_presets.iter().take(9).enumerate() {
        let label = format!("[{}] {}x ", i + 1, preset);
        spans.push(if (*preset - transport.speed).abs() < f32::EPSILON {
            Span::styled(label, Style::default().add_modifier(Modifier::REVERSED))
        } else {
            Span::raw(label)
        });
    }
    let loaded = mixer.attached_count();
    let total = mixer.tracks().len();
    if loaded < total {
        spans.push(Span::styled(
            format!("  loading {loaded}/{total}"),
            Style::default().fg(Color::Yellow),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::bordered().padding(padded()).title(" transport ")),
        areas.transport,
    );

    // Lanes
    frame.render_widget(Block::bordered().title(" tracks "), areas.lanes);
    for row in &areas.rows {
        match *row {
            LaneRow::Header(title, rect) => {
                frame.render_widget(Paragraph::new(Line::from(title).bold().underlined()), rect);
            }
            LaneRow::Track { id, index, area } => {
                if let Some(track) = mixer.track(id) {
                    let line = lane_line(app, mixer, track, index, progress, waveform_area(area).width);
                    frame.render_widget(Paragraph::new(line), area);
                }
            }
        }
    }

    if diarization_shown(app) {
        draw_diarization(frame, app, areas.diarization);
    }
}

fn lane_line(
    app: &App,
    mixer: &Mixer,
    track: &Track,
    index: usize,
    progress: f64,
    wave_width: u16,
) -> Line<'static> {
    let color = track_color(track);
    let audible = mixer.is_audible(track.id);
    let selected = app.selected_track().is_some_and(|t| t.id == track.id);
    let cursor = if selected { "> " } else { "  " };

    let name: String = track.name.chars().take(NAME_WIDTH).collect();
    let mut spans = vec![
        Span::raw(cursor),
        Span::styled(format!("{:<width$}", name, width = NAME_WIDTH), Style::default().fg(color)),
        Span::raw(" "),
        badge("M", track.muted, Color::Red),
        Span::raw(" "),
        badge("S", track.solo, Color::Yellow),
        Span::raw(format!(" {:>3}%  ", track.volume)),
    ];

    let bars = mixer::waveform_bars(index);
    let played = mixer::played_bars(progress, WAVEFORM_BARS);
    let width = usize::from(wave_width);
    for column in 0..width {
        let bar = column * WAVEFORM_BARS / width.max(1);
        let height = bars[bar];
        let level = ((height - 15.0) / 70.0 * (BAR_CHARS.len() - 1) as f64).round() as usize;
        let ch = BAR_CHARS[level.min(BAR_CHARS.len() - 1)];
        let fg = if audible && bar < played { color } else { UNPLAYED };
        let mut style = Style::default().fg(fg);
        if !audible {
            style = style.add_modifier(Modifier::DIM);
        }
        spans.push(Span::styled(ch.to_string(), style));
    }

    Line::from(spans)
}

fn badge(label: &'static str, on: bool, color: Color) -> Span<'static> {
    if on {
        Span::styled(label, Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD))
    } else {
        Span::styled(label, Style::default().fg(UNPLAYED))
    }
}

fn draw_diarization(frame: &mut Frame, app: &App, area: Rect) {
    let Some(d) = app.result.as_ref().and_then(|r| r.diarization.as_ref()) else {
        return;
    };
    let mut lines = vec![
        Line::from(format!("Method: {}", d.method.as_deref().unwrap_or("Unknown"))),
        Line::from(format!("Artists detected: {}", d.num_artists)),
    ];
    if let Some(message) = &d.message {
        lines.push(Line::from(message.clone()).italic());
    }
    if let Some(error) = &d.error {
        lines.push(Line::styled(format!("Error: {error}"), Style::default().fg(Color::Red)));
    }
    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::bordered().padding(padded()).title(" speaker diarization "))
            .wrap(Wrap { trim: true }),
        area,
    );
}
