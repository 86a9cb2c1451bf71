//! Multi-track mixer: the track model, the playback handle seam, transport
//! and per-track controls, and the pure display derivations used by the UI.

mod display;
mod handle;
mod model;
mod track;

pub use display::*;
pub use handle::MediaHandle;
pub use model::Mixer;
pub use track::*;

#[cfg(test)]
mod tests;
