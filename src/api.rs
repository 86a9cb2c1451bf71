//! Separation backend contract: request/response types and the HTTP client.

mod client;
mod types;

pub use client::*;
pub use types::*;

#[cfg(test)]
mod tests;
