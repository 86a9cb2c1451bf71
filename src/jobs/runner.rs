use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;

use crate::api::Backend;

use super::thread::spawn_job_thread;
use super::types::{JobCmd, JobEvent};

/// Owns the background thread that talks to the backend, so the UI thread
/// never blocks on the network.
pub struct JobRunner {
    tx: Sender<JobCmd>,
    rx: Receiver<JobEvent>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl JobRunner {
    pub fn new<B: Backend + Send + 'static>(backend: B) -> Self {
        let (tx, cmd_rx) = mpsc::channel::<JobCmd>();
        let (event_tx, rx) = mpsc::channel::<JobEvent>();
        let handle = spawn_job_thread(backend, cmd_rx, event_tx);

        Self {
            tx,
            rx,
            join: Mutex::new(Some(handle)),
        }
    }

    pub fn send(&self, cmd: JobCmd) -> Result<(), mpsc::SendError<JobCmd>> {
        self.tx.send(cmd)
    }

    /// Next finished job, if any. Never blocks.
    pub fn try_recv(&self) -> Option<JobEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Ask the thread to stop and wait for the job in flight to finish.
    pub fn shutdown(&self) {
        let _ = self.send(JobCmd::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }

    #[cfg(test)]
    pub(super) fn events(&self) -> &Receiver<JobEvent> {
        &self.rx
    }
}
