//! MPRIS service so media keys and `playerctl` can drive the mixer transport.
//!
//! The event loop publishes a [`TransportSnapshot`] every tick; the D-Bus
//! thread only ever reads it. Commands flow back as [`ControlCmd`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc::Sender};
use std::time::Duration;

use async_io::block_on;
use tracing::{debug, warn};
use zbus::{connection, interface};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::app::PlaybackState;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.stemdeck";
/// The whole separation result is presented as a single track.
const TRACK_PATH: &str = "/org/stemdeck/result";

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    /// Mapped to a full mixer reset.
    Stop,
    /// Relative seek in seconds.
    SeekBy(f64),
    /// Absolute seek in seconds.
    SeekTo(f64),
}

/// What the bus sees of the mixer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportSnapshot {
    pub playback: PlaybackState,
    pub title: Option<String>,
    pub position: Duration,
    /// Zero while the reference duration is unknown.
    pub length: Duration,
    pub rate: f64,
}

impl Default for TransportSnapshot {
    fn default() -> Self {
        Self {
            playback: PlaybackState::Stopped,
            title: None,
            position: Duration::ZERO,
            length: Duration::ZERO,
            rate: 1.0,
        }
    }
}

pub struct MprisHandle {
    state: Arc<Mutex<TransportSnapshot>>,
}

impl MprisHandle {
    pub fn publish(&self, snapshot: TransportSnapshot) {
        if let Ok(mut s) = self.state.lock() {
            *s = snapshot;
        }
    }
}

fn micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

fn status_str(playback: PlaybackState) -> &'static str {
    match playback {
        PlaybackState::Stopped => "Stopped",
        PlaybackState::Playing => "Playing",
        PlaybackState::Paused => "Paused",
    }
}

fn metadata(snapshot: &TransportSnapshot) -> HashMap<String, OwnedValue> {
    let mut map = HashMap::new();
    let mut insert = |key: &str, value: Value<'_>| match OwnedValue::try_from(value) {
        Ok(v) => {
            map.insert(key.to_string(), v);
        }
        Err(e) => debug!(%e, key, "could not encode MPRIS metadata"),
    };

    if let Some(title) = &snapshot.title {
        insert("mpris:trackid", Value::from(ObjectPath::from_static_str_unchecked(TRACK_PATH)));
        insert("xesam:title", Value::from(title.as_str()));
    }
    if !snapshot.length.is_zero() {
        insert("mpris:length", Value::from(micros(snapshot.length)));
    }
    map
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {}

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "stemdeck"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec![]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<TransportSnapshot>>,
}

impl PlayerIface {
    fn send(&self, cmd: ControlCmd) {
        if self.tx.send(cmd).is_err() {
            debug!("MPRIS command dropped: event loop is gone");
        }
    }

    fn snapshot(&self) -> TransportSnapshot {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    // One result is one "song"; there is nothing to skip to.
    fn next(&self) {}

    fn previous(&self) {}

    fn play(&self) {
        self.send(ControlCmd::Play);
    }

    fn pause(&self) {
        self.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(ControlCmd::Stop);
    }

    /// `offset` is in microseconds.
    fn seek(&self, offset: i64) {
        self.send(ControlCmd::SeekBy(offset as f64 / 1e6));
    }

    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        if track_id.as_str() != TRACK_PATH || position < 0 {
            return;
        }
        self.send(ControlCmd::SeekTo(position as f64 / 1e6));
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        status_str(self.snapshot().playback)
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        micros(self.snapshot().position)
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        self.snapshot().rate
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        metadata(&self.snapshot())
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        false
    }
}

async fn serve(tx: Sender<ControlCmd>, state: Arc<Mutex<TransportSnapshot>>) -> zbus::Result<()> {
    let _connection = connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, RootIface { tx: tx.clone() })?
        .serve_at(OBJECT_PATH, PlayerIface { tx, state })?
        .build()
        .await?;
    debug!("MPRIS service registered");

    // The service lives as long as the connection does.
    std::future::pending::<()>().await;
    Ok(())
}

/// Register the MPRIS service on the session bus from a background thread.
/// Without a session bus the handle still works; nothing is published.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(TransportSnapshot::default()));

    let state_for_thread = state.clone();
    let spawned = std::thread::Builder::new()
        .name("mpris".into())
        .spawn(move || {
            if let Err(e) = block_on(serve(tx, state_for_thread)) {
                warn!(%e, "MPRIS unavailable");
            }
        });
    if let Err(e) = spawned {
        warn!(%e, "could not start MPRIS thread");
    }

    MprisHandle { state }
}
