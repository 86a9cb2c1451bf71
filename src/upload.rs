//! Choosing what to upload: file validation and separation options.

mod file;
mod form;

pub use file::{SelectedFile, select_file};
pub use form::*;

#[cfg(test)]
mod tests;
