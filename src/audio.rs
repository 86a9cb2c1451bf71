//! Native audio output and the `rodio` implementation of [`MediaHandle`].
//!
//! [`MediaHandle`]: crate::mixer::MediaHandle

mod sink;

use rodio::{OutputStream, OutputStreamBuilder};

use crate::error::{Error, MediaError};

pub use sink::RodioHandle;

/// The default output device. Every track handle mixes into it.
pub struct AudioOutput {
    stream: OutputStream,
}

impl AudioOutput {
    pub fn open() -> Result<Self, Error> {
        let mut stream =
            OutputStreamBuilder::open_default_stream().map_err(|e| Error::AudioOutput(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);
        Ok(Self { stream })
    }

    /// Decode `bytes` into a paused handle connected to this output.
    pub fn handle(&self, bytes: Vec<u8>) -> Result<RodioHandle, MediaError> {
        RodioHandle::new(bytes, self.stream.mixer())
    }
}
