//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the selected file, the
//! separation options and the mixer built from the backend's result.

mod model;

pub use model::*;
