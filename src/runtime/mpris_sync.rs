use crate::app::App;
use crate::mpris::{MprisHandle, TransportSnapshot};

pub fn snapshot(app: &App) -> TransportSnapshot {
    let mut snapshot = TransportSnapshot {
        playback: app.playback_state(),
        title: app.title().map(str::to_string),
        ..TransportSnapshot::default()
    };
    if let Some(t) = app.mixer.as_ref().map(|m| m.transport()) {
        snapshot.position = t.position;
        snapshot.length = t.duration;
        snapshot.rate = f64::from(t.speed);
    }
    snapshot
}

pub fn update_mpris(mpris: &MprisHandle, app: &App) {
    mpris.publish(snapshot(app));
}
