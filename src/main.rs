mod api;
mod app;
mod audio;
mod cli;
mod config;
mod error;
mod jobs;
mod mixer;
mod mpris;
mod runtime;
mod ui;
mod upload;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
