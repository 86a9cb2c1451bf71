//! The multi-track mixer: transport and per-track controls over a set of
//! synchronized playback handles.

use std::time::Duration;

use tracing::{debug, warn};

use crate::api::SeparationResult;
use crate::error::MediaError;

use super::display;
use super::handle::{HandleRegistry, MediaHandle};
use super::track::{self, Track, TrackId};

/// Shared transport state, driven by the reference track.
#[derive(Debug, Clone, PartialEq)]
pub struct Transport {
    pub playing: bool,
    pub speed: f32,
    /// Displayed playback position.
    pub position: Duration,
    /// Reference track duration; zero while unknown.
    pub duration: Duration,
    /// Set while the user drags a seek control.
    pub dragging: bool,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            playing: false,
            speed: 1.0,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            dragging: false,
        }
    }
}

pub struct Mixer {
    tracks: Vec<Track>,
    handles: HandleRegistry,
    transport: Transport,
}

impl Mixer {
    /// Build the track set for `result`; stem URLs are resolved against `base_url`.
    pub fn new(result: &SeparationResult, base_url: &str) -> Self {
        Self::from_tracks(track::build_tracks(result, base_url))
    }

    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            handles: HandleRegistry::default(),
            transport: Transport::default(),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The first track in creation order.
    pub fn reference(&self) -> Option<TrackId> {
        self.tracks.first().map(|t| t.id)
    }

    #[cfg(test)]
    pub fn is_attached(&self, id: TrackId) -> bool {
        self.handles.contains(id)
    }

    pub fn attached_count(&self) -> usize {
        self.handles.len()
    }

    /// Register the playback handle for `id` and bring it in line with the
    /// current transport. Returns false when `id` is not part of this track set.
    pub fn attach(&mut self, id: TrackId, mut handle: Box<dyn MediaHandle>) -> bool {
        let Some(track) = self.track(id).cloned() else {
            debug!(?id, "dropping handle for unknown track");
            return false;
        };

        let any_solo = track::any_solo(&self.tracks);
        let position = self.transport.position;
        let results = [
            ("set_rate", handle.set_rate(self.transport.speed)),
            ("set_gain", handle.set_gain(track.gain())),
            ("set_muted", handle.set_muted(!track::is_audible(&track, any_solo))),
            (
                "seek",
                if position.is_zero() {
                    Ok(())
                } else {
                    handle.seek(position)
                },
            ),
            (
                "play",
                if self.transport.playing {
                    handle.play()
                } else {
                    Ok(())
                },
            ),
        ];
        for (op, result) in results {
            log_failure(&track, op, result);
        }

        let duration = handle.duration();
        self.handles.insert(id, handle);
        debug!(track = %track.name, ?duration, "attached playback handle");

        if Some(id) == self.reference() {
            self.on_metadata(id, duration);
        }
        true
    }

    pub fn play(&mut self) {
        self.for_each_handle("play", |h| h.play());
        self.transport.playing = true;
    }

    pub fn pause(&mut self) {
        self.for_each_handle("pause", |h| h.pause());
        self.transport.playing = false;
    }

    pub fn toggle_play(&mut self) {
        if self.transport.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Move every track to `seconds`, clamped to `[0, duration]`. Ignored until
    /// the reference duration is known.
    pub fn seek(&mut self, seconds: f64) {
        let duration = self.transport.duration.as_secs_f64();
        if duration <= 0.0 {
            debug!(seconds, "seek ignored: duration unknown");
            return;
        }

        let target = if seconds.is_nan() {
            0.0
        } else {
            seconds.clamp(0.0, duration)
        };
        let position = Duration::from_secs_f64(target);
        self.for_each_handle("seek", |h| h.seek(position));
        // Do not wait for the reference track to report the new position.
        self.transport.position = position;
    }

    pub fn seek_by(&mut self, delta_seconds: f64) {
        self.seek(self.transport.position.as_secs_f64() + delta_seconds);
    }

    /// Seek to `fraction` (clamped `0..=1`) of the duration.
    pub fn seek_fraction(&mut self, fraction: f64) {
        let duration = self.transport.duration.as_secs_f64();
        if duration <= 0.0 {
            return;
        }
        self.seek(fraction.clamp(0.0, 1.0) * duration);
    }

    pub fn set_speed(&mut self, multiplier: f32) {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            warn!(multiplier, "rejected playback speed");
            return;
        }
        self.for_each_handle("set_rate", |h| h.set_rate(multiplier));
        self.transport.speed = multiplier;
    }

    /// Pause everything, rewind to zero and restore normal speed.
    pub fn reset(&mut self) {
        self.for_each_handle("pause", |h| h.pause());
        self.for_each_handle("seek", |h| h.seek(Duration::ZERO));
        self.for_each_handle("set_rate", |h| h.set_rate(1.0));
        self.transport.playing = false;
        self.transport.speed = 1.0;
        self.transport.position = Duration::ZERO;
    }

    pub fn toggle_mute(&mut self, id: TrackId) {
        self.tracks = track::with_mute_toggled(&self.tracks, id);
        self.apply_audibility(Some(id));
    }

    pub fn toggle_solo(&mut self, id: TrackId) {
        self.tracks = track::with_solo_toggled(&self.tracks, id);
        self.apply_audibility(None);
    }

    pub fn set_volume(&mut self, id: TrackId, percent: i32) {
        self.tracks = track::with_volume(&self.tracks, id, percent);
        let Some(track) = self.track(id).cloned() else {
            return;
        };
        if let Some(handle) = self.handles.get_mut(id) {
            log_failure(&track, "set_gain", handle.set_gain(track.gain()));
        }
    }

    /// Whether `id` is currently heard, after solo is taken into account.
    pub fn is_audible(&self, id: TrackId) -> bool {
        let any_solo = track::any_solo(&self.tracks);
        self.track(id)
            .is_some_and(|t| track::is_audible(t, any_solo))
    }

    pub fn begin_drag(&mut self) {
        self.transport.dragging = true;
    }

    pub fn end_drag(&mut self) {
        self.transport.dragging = false;
    }

    pub fn on_metadata(&mut self, id: TrackId, duration: Option<Duration>) {
        if Some(id) != self.reference() {
            return;
        }
        if let Some(d) = duration.filter(|d| !d.is_zero()) {
            self.transport.duration = d;
        }
    }

    pub fn on_position(&mut self, id: TrackId, position: Duration) {
        if Some(id) != self.reference() || self.transport.dragging {
            return;
        }
        self.transport.position = position;
    }

    pub fn on_ended(&mut self, id: TrackId) {
        if Some(id) == self.reference() {
            self.transport.playing = false;
        }
    }

    /// Read the reference handle and dispatch its notifications.
    pub fn poll_reference(&mut self) {
        let Some(id) = self.reference() else {
            return;
        };
        let Some(handle) = self.handles.get(id) else {
            return;
        };
        let (position, duration, ended) = (handle.position(), handle.duration(), handle.ended());

        if self.transport.duration.is_zero() {
            self.on_metadata(id, duration);
        }
        self.on_position(id, position);
        if self.transport.playing && ended {
            self.on_ended(id);
        }
    }

    pub fn position_secs(&self) -> f64 {
        self.transport.position.as_secs_f64()
    }

    pub fn duration_secs(&self) -> f64 {
        self.transport.duration.as_secs_f64()
    }

    pub fn progress_percent(&self) -> f64 {
        display::progress_percent(self.position_secs(), self.duration_secs())
    }

    fn apply_audibility(&mut self, only: Option<TrackId>) {
        let any_solo = track::any_solo(&self.tracks);
        for t in &self.tracks {
            if only.is_some_and(|id| id != t.id) {
                continue;
            }
            if let Some(handle) = self.handles.get_mut(t.id) {
                log_failure(t, "set_muted", handle.set_muted(!track::is_audible(t, any_solo)));
            }
        }
    }

    /// Apply `f` to every attached handle in track order. Failures are logged
    /// and do not stop the pass.
    fn for_each_handle(
        &mut self,
        op: &str,
        mut f: impl FnMut(&mut dyn MediaHandle) -> Result<(), MediaError>,
    ) {
        for t in &self.tracks {
            if let Some(handle) = self.handles.get_mut(t.id) {
                log_failure(t, op, f(handle));
            }
        }
    }
}

fn log_failure(track: &Track, op: &str, result: Result<(), MediaError>) {
    if let Err(err) = result {
        warn!(track = %track.name, op, %err, "playback handle operation failed");
    }
}
