//! Background jobs against the separation backend: uploads, track downloads
//! and saving stems to disk.

mod runner;
mod thread;
mod types;

pub use runner::JobRunner;
pub use types::{JobCmd, JobEvent};
