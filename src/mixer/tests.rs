use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::*;
use crate::api::{Diarization, SeparationResult};
use crate::error::MediaError;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Play,
    Pause,
    Seek(Duration),
    Rate(f32),
    Gain(f32),
    Muted(bool),
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Call>,
    position: Duration,
    duration: Option<Duration>,
    ended: bool,
    muted: bool,
    gain: f32,
    fail_play: bool,
}

/// Records every control and lets the test drive what the handle reports.
struct FakeHandle(Rc<RefCell<FakeState>>);

impl FakeHandle {
    fn new(duration: Option<Duration>) -> (Self, Rc<RefCell<FakeState>>) {
        let state = Rc::new(RefCell::new(FakeState {
            duration,
            gain: 1.0,
            ..Default::default()
        }));
        (Self(state.clone()), state)
    }
}

impl MediaHandle for FakeHandle {
    fn play(&mut self) -> Result<(), MediaError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::Play);
        if s.fail_play {
            return Err(MediaError::Decode("autoplay blocked".into()));
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), MediaError> {
        self.0.borrow_mut().calls.push(Call::Pause);
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), MediaError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::Seek(position));
        s.position = position;
        Ok(())
    }

    fn set_rate(&mut self, rate: f32) -> Result<(), MediaError> {
        self.0.borrow_mut().calls.push(Call::Rate(rate));
        Ok(())
    }

    fn set_gain(&mut self, gain: f32) -> Result<(), MediaError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::Gain(gain));
        s.gain = gain;
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), MediaError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::Muted(muted));
        s.muted = muted;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.0.borrow().position
    }

    fn duration(&self) -> Option<Duration> {
        self.0.borrow().duration
    }

    fn ended(&self) -> bool {
        self.0.borrow().ended
    }
}

const BASE: &str = "http://backend:8080";

fn result(stems: &[&str], diarization: Option<Diarization>) -> SeparationResult {
    SeparationResult {
        stems: stems.iter().map(|s| s.to_string()).collect(),
        original_audio_path: None,
        diarization,
    }
}

fn four_stem_result() -> SeparationResult {
    result(&["job/vocals.wav", "job/drums.wav", "job/bass.wav", "job/other.wav"], None)
}

/// A mixer over four stems with a fake handle attached to each track.
fn attached_mixer(duration_secs: u64) -> (Mixer, Vec<Rc<RefCell<FakeState>>>) {
    let mut mixer = Mixer::new(&four_stem_result(), BASE);
    let ids: Vec<TrackId> = mixer.tracks().iter().map(|t| t.id).collect();
    let mut states = Vec::new();
    for id in ids {
        let (handle, state) = FakeHandle::new(Some(Duration::from_secs(duration_secs)));
        assert!(mixer.attach(id, Box::new(handle)));
        state.borrow_mut().calls.clear();
        states.push(state);
    }
    (mixer, states)
}

#[test]
fn multi_artist_diarization_replaces_vocals_with_artist_tracks() {
    let diarization = Diarization {
        enabled: true,
        num_artists: 2,
        artists: vec![
            ("artist_0".into(), "a.wav".into()),
            ("artist_1".into(), "b.wav".into()),
        ],
        ..Default::default()
    };
    let tracks = build_tracks(&result(&["vocals.wav", "drums.wav"], Some(diarization)), BASE);

    let summary: Vec<(&str, TrackKind)> = tracks.iter().map(|t| (t.name.as_str(), t.kind)).collect();
    assert_eq!(
        summary,
        vec![
            ("Drums", TrackKind::Stem),
            ("🎤 Artist 0", TrackKind::Artist),
            ("🎤 Artist 1", TrackKind::Artist),
        ]
    );
    assert_eq!(tracks[1].source_url, "http://backend:8080/stems/a.wav");
}

#[test]
fn single_artist_diarization_keeps_vocals() {
    let diarization = Diarization {
        enabled: true,
        num_artists: 1,
        artists: vec![],
        ..Default::default()
    };
    let tracks = build_tracks(&result(&["vocals.wav", "drums.wav"], Some(diarization)), BASE);
    let names: Vec<&str> = tracks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Vocals", "Drums"]);
    assert!(tracks.iter().all(|t| t.kind == TrackKind::Stem));
}

#[test]
fn new_tracks_start_at_full_volume_unmuted_and_not_solo() {
    let mixer = Mixer::new(&four_stem_result(), BASE);
    assert_eq!(mixer.tracks().len(), 4);
    for t in mixer.tracks() {
        assert_eq!(t.volume, 100);
        assert!(!t.muted);
        assert!(!t.solo);
    }
    let t = mixer.transport();
    assert!(!t.playing);
    assert_eq!(t.speed, 1.0);
    assert_eq!(t.position, Duration::ZERO);
    assert_eq!(mixer.reference(), Some(mixer.tracks()[0].id));
}

#[test]
fn rebuilding_tracks_never_reuses_ids() {
    let a = Mixer::new(&four_stem_result(), BASE);
    let b = Mixer::new(&four_stem_result(), BASE);
    for t in a.tracks() {
        assert!(b.track(t.id).is_none());
    }
}

#[test]
fn stem_display_names_are_title_cased_without_extension() {
    assert_eq!(stem_display_name("job/lead_vocals.WAV"), "Lead Vocals");
    assert_eq!(stem_display_name("other.flac"), "Other");
    assert_eq!(stem_display_name("job/no_ext"), "No Ext");
    assert_eq!(stem_display_name("job/"), "Unknown Stem");
    assert_eq!(stem_display_name("take.2.mp3"), "Take.2");
}

#[test]
fn stem_urls_join_base_and_relative_path() {
    assert_eq!(stem_url("http://h:1/", "/x/y.wav"), "http://h:1/stems/x/y.wav");
    assert_eq!(stem_url("http://h:1", "x.wav"), "http://h:1/stems/x.wav");
}

#[test]
fn volume_is_clamped_and_applied_as_normalized_gain() {
    let (mut mixer, states) = attached_mixer(120);
    let id = mixer.tracks()[1].id;

    mixer.set_volume(id, 250);
    assert_eq!(mixer.track(id).unwrap().volume, 100);
    assert_eq!(states[1].borrow().gain, 1.0);

    mixer.set_volume(id, -20);
    assert_eq!(mixer.track(id).unwrap().volume, 0);
    assert_eq!(states[1].borrow().gain, 0.0);

    mixer.set_volume(id, 40);
    assert_eq!(states[1].borrow().gain, 0.4);
    // Only the target handle is touched.
    assert!(states[0].borrow().calls.is_empty());
}

#[test]
fn muted_track_keeps_its_volume() {
    let (mut mixer, states) = attached_mixer(120);
    let id = mixer.tracks()[0].id;
    mixer.set_volume(id, 30);
    mixer.toggle_mute(id);

    assert!(states[0].borrow().muted);
    assert_eq!(mixer.track(id).unwrap().volume, 30);
    assert_eq!(states[0].borrow().gain, 0.3);

    mixer.toggle_mute(id);
    assert!(!states[0].borrow().muted);
    assert_eq!(states[0].borrow().gain, 0.3);
}

#[test]
fn seek_clamps_to_duration_bounds() {
    let (mut mixer, states) = attached_mixer(120);

    mixer.seek(500.0);
    assert_eq!(mixer.transport().position, Duration::from_secs(120));
    for s in &states {
        assert_eq!(s.borrow().position, Duration::from_secs(120));
    }

    mixer.seek(-3.0);
    assert_eq!(mixer.transport().position, Duration::ZERO);
    for s in &states {
        assert_eq!(s.borrow().position, Duration::ZERO);
    }

    mixer.seek(f64::NAN);
    assert_eq!(mixer.transport().position, Duration::ZERO);
}

#[test]
fn seek_updates_displayed_position_without_waiting_for_handles() {
    let (mut mixer, _states) = attached_mixer(120);
    mixer.seek(42.5);
    assert_eq!(mixer.position_secs(), 42.5);
}

#[test]
fn seek_is_ignored_until_duration_is_known() {
    let mut mixer = Mixer::new(&four_stem_result(), BASE);
    let id = mixer.tracks()[1].id;
    let (handle, state) = FakeHandle::new(None);
    mixer.attach(id, Box::new(handle));
    state.borrow_mut().calls.clear();

    mixer.seek(10.0);
    mixer.seek_fraction(0.5);
    assert_eq!(mixer.transport().position, Duration::ZERO);
    assert!(state.borrow().calls.is_empty());
}

#[test]
fn solo_forces_other_tracks_inaudible_regardless_of_their_mute() {
    let (mut mixer, states) = attached_mixer(120);
    let ids: Vec<TrackId> = mixer.tracks().iter().map(|t| t.id).collect();

    // B is muted, C is not; after soloing A both must be silent.
    mixer.toggle_mute(ids[1]);
    mixer.toggle_solo(ids[0]);

    assert!(mixer.is_audible(ids[0]));
    for (i, id) in ids.iter().enumerate().skip(1) {
        assert!(!mixer.is_audible(*id));
        assert!(states[i].borrow().muted);
    }
    assert!(!states[0].borrow().muted);

    // A's audibility follows its own mute flag while soloed.
    mixer.toggle_mute(ids[0]);
    assert!(!mixer.is_audible(ids[0]));
    assert!(states[0].borrow().muted);
}

#[test]
fn clearing_the_last_solo_restores_each_tracks_own_mute() {
    let (mut mixer, states) = attached_mixer(120);
    let ids: Vec<TrackId> = mixer.tracks().iter().map(|t| t.id).collect();

    mixer.toggle_mute(ids[2]);
    mixer.toggle_solo(ids[0]);
    mixer.toggle_solo(ids[0]);

    for (i, t) in mixer.tracks().iter().enumerate() {
        assert_eq!(mixer.is_audible(t.id), !t.muted);
        assert_eq!(states[i].borrow().muted, t.muted);
    }
    assert!(states[2].borrow().muted);
}

#[test]
fn solo_and_mute_are_independent_flags() {
    let (mut mixer, _states) = attached_mixer(120);
    let id = mixer.tracks()[3].id;
    mixer.toggle_solo(id);
    mixer.toggle_mute(id);
    let t = mixer.track(id).unwrap();
    assert!(t.solo);
    assert!(t.muted);
}

#[test]
fn several_solo_tracks_are_all_audible() {
    let (mut mixer, _states) = attached_mixer(120);
    let ids: Vec<TrackId> = mixer.tracks().iter().map(|t| t.id).collect();
    mixer.toggle_solo(ids[0]);
    mixer.toggle_solo(ids[2]);
    assert!(mixer.is_audible(ids[0]));
    assert!(!mixer.is_audible(ids[1]));
    assert!(mixer.is_audible(ids[2]));
    assert!(!mixer.is_audible(ids[3]));
}

#[test]
fn play_failure_on_one_handle_does_not_stop_the_others() {
    let (mut mixer, states) = attached_mixer(120);
    states[1].borrow_mut().fail_play = true;

    mixer.play();

    assert!(mixer.transport().playing);
    for s in &states {
        assert_eq!(s.borrow().calls, vec![Call::Play]);
    }
}

#[test]
fn speed_applies_to_every_track() {
    let (mut mixer, states) = attached_mixer(120);
    mixer.set_speed(2.0);
    assert_eq!(mixer.transport().speed, 2.0);
    for s in &states {
        assert_eq!(s.borrow().calls, vec![Call::Rate(2.0)]);
    }

    mixer.set_speed(0.0);
    mixer.set_speed(f32::NAN);
    assert_eq!(mixer.transport().speed, 2.0);
}

#[test]
fn reset_always_pauses_rewinds_and_restores_speed() {
    let (mut mixer, states) = attached_mixer(120);
    mixer.play();
    mixer.set_speed(0.5);
    mixer.seek(77.0);

    mixer.reset();

    let t = mixer.transport();
    assert!(!t.playing);
    assert_eq!(t.speed, 1.0);
    assert_eq!(t.position, Duration::ZERO);
    for s in &states {
        let s = s.borrow();
        assert_eq!(s.position, Duration::ZERO);
        assert_eq!(
            &s.calls[s.calls.len() - 3..],
            &[Call::Pause, Call::Seek(Duration::ZERO), Call::Rate(1.0)]
        );
    }
}

#[test]
fn only_reference_track_drives_position_and_end_of_stream() {
    let (mut mixer, states) = attached_mixer(120);
    let ids: Vec<TrackId> = mixer.tracks().iter().map(|t| t.id).collect();
    mixer.play();

    mixer.on_position(ids[1], Duration::from_secs(9));
    assert_eq!(mixer.transport().position, Duration::ZERO);
    mixer.on_ended(ids[1]);
    assert!(mixer.transport().playing);

    states[0].borrow_mut().position = Duration::from_secs(30);
    mixer.poll_reference();
    assert_eq!(mixer.transport().position, Duration::from_secs(30));
    assert_eq!(mixer.progress_percent(), 25.0);

    states[0].borrow_mut().ended = true;
    mixer.poll_reference();
    assert!(!mixer.transport().playing);
}

#[test]
fn dragging_suppresses_reference_position_updates() {
    let (mut mixer, states) = attached_mixer(120);
    let reference = mixer.reference().unwrap();

    mixer.begin_drag();
    mixer.seek(60.0);
    states[0].borrow_mut().position = Duration::from_secs(3);
    mixer.poll_reference();
    mixer.on_position(reference, Duration::from_secs(4));
    assert_eq!(mixer.transport().position, Duration::from_secs(60));

    mixer.end_drag();
    mixer.poll_reference();
    assert_eq!(mixer.transport().position, Duration::from_secs(3));
}

#[test]
fn duration_comes_from_the_reference_handle_only() {
    let mut mixer = Mixer::new(&four_stem_result(), BASE);
    let ids: Vec<TrackId> = mixer.tracks().iter().map(|t| t.id).collect();

    let (follower, _) = FakeHandle::new(Some(Duration::from_secs(99)));
    mixer.attach(ids[1], Box::new(follower));
    assert_eq!(mixer.duration_secs(), 0.0);

    let (reference, state) = FakeHandle::new(None);
    mixer.attach(ids[0], Box::new(reference));
    assert_eq!(mixer.duration_secs(), 0.0);

    state.borrow_mut().duration = Some(Duration::from_secs(180));
    mixer.poll_reference();
    assert_eq!(mixer.duration_secs(), 180.0);
}

#[test]
fn late_handles_join_the_current_transport_state() {
    let mut mixer = Mixer::new(&four_stem_result(), BASE);
    let ids: Vec<TrackId> = mixer.tracks().iter().map(|t| t.id).collect();

    let (reference, _) = FakeHandle::new(Some(Duration::from_secs(120)));
    mixer.attach(ids[0], Box::new(reference));
    mixer.toggle_solo(ids[0]);
    mixer.set_volume(ids[2], 50);
    mixer.set_speed(2.0);
    mixer.seek(12.0);
    mixer.play();

    let (late, state) = FakeHandle::new(Some(Duration::from_secs(120)));
    assert!(mixer.attach(ids[2], Box::new(late)));
    assert_eq!(
        state.borrow().calls,
        vec![
            Call::Rate(2.0),
            Call::Gain(0.5),
            Call::Muted(true),
            Call::Seek(Duration::from_secs(12)),
            Call::Play,
        ]
    );
}

#[test]
fn attach_rejects_ids_from_another_track_set() {
    let old = Mixer::new(&four_stem_result(), BASE);
    let mut current = Mixer::new(&four_stem_result(), BASE);
    let (handle, _) = FakeHandle::new(None);
    assert!(!current.attach(old.tracks()[0].id, Box::new(handle)));
    assert_eq!(current.attached_count(), 0);
}

#[test]
fn progress_percent_examples() {
    assert_eq!(progress_percent(30.0, 120.0), 25.0);
    assert_eq!(progress_percent(30.0, 0.0), 0.0);
    assert_eq!(progress_percent(-1.0, 120.0), 0.0);
    assert_eq!(progress_percent(500.0, 120.0), 100.0);
    assert_eq!(progress_percent(5.0, f64::NAN), 0.0);
}

#[test]
fn waveform_is_stable_and_bounded_per_track_index() {
    assert_eq!(waveform_bars(3), waveform_bars(3));
    assert_ne!(waveform_bars(0), waveform_bars(1));
    for index in 0..8 {
        assert!(waveform_bars(index).iter().all(|h| (15.0..=85.0).contains(h)));
    }
    assert_eq!(waveform_bars(0)[0], 25.0);
}

#[test]
fn played_bars_counts_bars_left_of_progress() {
    assert_eq!(played_bars(0.0, 40), 0);
    assert_eq!(played_bars(25.0, 40), 10);
    assert_eq!(played_bars(26.0, 40), 11);
    assert_eq!(played_bars(100.0, 40), 40);
}

#[test]
fn timeline_fraction_is_clamped() {
    assert_eq!(timeline_fraction(50.0, 200.0), 0.25);
    assert_eq!(timeline_fraction(-5.0, 200.0), 0.0);
    assert_eq!(timeline_fraction(250.0, 200.0), 1.0);
    assert_eq!(timeline_fraction(10.0, 0.0), 0.0);
}

#[test]
fn seek_fraction_maps_timeline_position_to_time() {
    let (mut mixer, _states) = attached_mixer(200);
    mixer.seek_fraction(timeline_fraction(30.0, 120.0));
    assert_eq!(mixer.position_secs(), 50.0);
}

#[test]
fn format_time_renders_minutes_and_seconds() {
    assert_eq!(format_time(0.0), "0:00");
    assert_eq!(format_time(65.9), "1:05");
    assert_eq!(format_time(600.0), "10:00");
    assert_eq!(format_time(-1.0), "0:00");
    assert_eq!(format_time(f64::NAN), "0:00");
}
