//! The playback handle seam and the registry the mixer keeps them in.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::MediaError;

use super::track::TrackId;

/// One natively decoded audio stream.
///
/// Every control may fail independently; the mixer logs a failure and moves
/// on to the next handle.
pub trait MediaHandle {
    fn play(&mut self) -> Result<(), MediaError>;
    fn pause(&mut self) -> Result<(), MediaError>;
    fn seek(&mut self, position: Duration) -> Result<(), MediaError>;
    fn set_rate(&mut self, rate: f32) -> Result<(), MediaError>;
    /// Gain in `0.0..=1.0`. Kept while muted.
    fn set_gain(&mut self, gain: f32) -> Result<(), MediaError>;
    fn set_muted(&mut self, muted: bool) -> Result<(), MediaError>;

    fn position(&self) -> Duration;
    /// Total length, when the decoder knows it.
    fn duration(&self) -> Option<Duration>;
    /// True once the stream has played to its natural end.
    fn ended(&self) -> bool;
}

/// Side table of playback handles keyed by track identity.
#[derive(Default)]
pub struct HandleRegistry {
    handles: HashMap<TrackId, Box<dyn MediaHandle>>,
}

impl HandleRegistry {
    pub fn insert(&mut self, id: TrackId, handle: Box<dyn MediaHandle>) {
        self.handles.insert(id, handle);
    }

    pub fn get(&self, id: TrackId) -> Option<&dyn MediaHandle> {
        self.handles.get(&id).map(|h| h.as_ref())
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut (dyn MediaHandle + 'static)> {
        self.handles.get_mut(&id).map(|h| h.as_mut())
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.handles.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }
}
