//! `rodio` sinks built from downloaded track audio.
//!
//! Each track keeps its encoded bytes in memory so the sink can be rebuilt
//! when a seek is not supported by the decoder or the stream already ended.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use rodio::mixer::Mixer;
use rodio::{Decoder, Sink, Source};
use tracing::debug;

use crate::error::MediaError;
use crate::mixer::MediaHandle;

/// Volume handed to the sink for a given gain and mute state.
pub(super) fn effective_volume(gain: f32, muted: bool) -> f32 {
    if muted { 0.0 } else { gain.clamp(0.0, 1.0) }
}

/// A paused `Sink` over an in-memory copy of one track.
pub struct RodioHandle {
    bytes: Arc<[u8]>,
    mixer: Mixer,
    sink: Sink,
    duration: Option<Duration>,
    /// Start offset of the current sink when it was built with `skip_duration`.
    offset: Duration,
    rate: f32,
    gain: f32,
    muted: bool,
}

impl RodioHandle {
    pub(super) fn new(bytes: Vec<u8>, mixer: &Mixer) -> Result<Self, MediaError> {
        let bytes: Arc<[u8]> = bytes.into();
        let source = decode(&bytes)?;
        let duration = source.total_duration();

        let sink = Sink::connect_new(mixer);
        sink.append(source);
        sink.pause();

        Ok(Self {
            bytes,
            mixer: mixer.clone(),
            sink,
            duration,
            offset: Duration::ZERO,
            rate: 1.0,
            gain: 1.0,
            muted: false,
        })
    }

    /// Replace the sink with a fresh one starting at `start_at`, keeping the
    /// play state, rate and volume.
    fn rebuild_at(&mut self, start_at: Duration) -> Result<(), MediaError> {
        let was_playing = !self.sink.is_paused() && !self.sink.empty();
        // `skip_duration` is the fallback seeking primitive.
        let source = decode(&self.bytes)?.skip_duration(start_at);

        let sink = Sink::connect_new(&self.mixer);
        sink.set_speed(self.rate);
        sink.set_volume(effective_volume(self.gain, self.muted));
        sink.append(source);
        if !was_playing {
            sink.pause();
        }

        self.sink.stop();
        self.sink = sink;
        self.offset = start_at;
        debug!(?start_at, "rebuilt sink");
        Ok(())
    }

    fn apply_volume(&self) {
        self.sink.set_volume(effective_volume(self.gain, self.muted));
    }
}

impl MediaHandle for RodioHandle {
    fn play(&mut self) -> Result<(), MediaError> {
        if self.sink.empty() {
            self.rebuild_at(Duration::ZERO)?;
        }
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) -> Result<(), MediaError> {
        self.sink.pause();
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), MediaError> {
        if self.sink.empty() {
            return self.rebuild_at(position);
        }
        match self.sink.try_seek(position) {
            Ok(()) => {
                self.offset = Duration::ZERO;
                Ok(())
            }
            Err(err) => {
                debug!(%err, "decoder seek unsupported, rebuilding sink");
                self.rebuild_at(position)
                    .map_err(|e| MediaError::Seek(format!("{err}; {e}")))
            }
        }
    }

    fn set_rate(&mut self, rate: f32) -> Result<(), MediaError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(MediaError::InvalidRate(rate));
        }
        self.rate = rate;
        self.sink.set_speed(rate);
        Ok(())
    }

    fn set_gain(&mut self, gain: f32) -> Result<(), MediaError> {
        self.gain = gain.clamp(0.0, 1.0);
        self.apply_volume();
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), MediaError> {
        self.muted = muted;
        self.apply_volume();
        Ok(())
    }

    fn position(&self) -> Duration {
        let position = self.offset + self.sink.get_pos();
        match self.duration {
            Some(d) => position.min(d),
            None => position,
        }
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn ended(&self) -> bool {
        self.sink.empty()
    }
}

fn decode(bytes: &Arc<[u8]>) -> Result<Decoder<Cursor<Arc<[u8]>>>, MediaError> {
    Decoder::new(Cursor::new(bytes.clone())).map_err(|e| MediaError::Decode(e.to_string()))
}
