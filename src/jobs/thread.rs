use std::fs;
use std::path::Path;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::api::Backend;
use crate::error::ApiError;

use super::types::{JobCmd, JobEvent};

pub(super) fn spawn_job_thread<B>(
    backend: B,
    rx: Receiver<JobCmd>,
    events: Sender<JobEvent>,
) -> JoinHandle<()>
where
    B: Backend + Send + 'static,
{
    thread::spawn(move || {
        // Jobs run one at a time, in the order they were sent.
        while let Ok(cmd) = rx.recv() {
            let event = match cmd {
                JobCmd::Separate { serial, request } => {
                    info!(serial, file = %request.file.display(), "separation job started");
                    let result = backend.separate(&request);
                    if let Err(err) = &result {
                        warn!(serial, %err, "separation failed");
                    }
                    JobEvent::Separated { serial, result }
                }
                JobCmd::Fetch { id, url } => {
                    debug!(?id, %url, "fetching track audio");
                    let result = backend.fetch(&url);
                    if let Err(err) = &result {
                        warn!(?id, %url, %err, "track fetch failed");
                    }
                    JobEvent::Fetched { id, result }
                }
                JobCmd::Save { url, dest } => {
                    let result = save(&backend, &url, &dest).map(|()| dest.clone());
                    match &result {
                        Ok(path) => info!(path = %path.display(), "saved track"),
                        Err(err) => warn!(%url, %err, "saving track failed"),
                    }
                    JobEvent::Saved(result)
                }
                JobCmd::Quit => break,
            };

            if events.send(event).is_err() {
                // Receiver gone: nobody is left to report to.
                break;
            }
        }
        debug!("job thread stopped");
    })
}

fn save<B: Backend>(backend: &B, url: &str, dest: &Path) -> Result<(), ApiError> {
    let bytes = backend.fetch(url)?;
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, bytes)?;
    Ok(())
}
