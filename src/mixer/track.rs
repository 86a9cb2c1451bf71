//! Track records and the pure transformations the mixer applies to them.
//!
//! A track set is an ordered `Vec<Track>`. Control operations never mutate a
//! track in place; they return a new collection with one record replaced.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::api::SeparationResult;

static NEXT_TRACK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique track identity. Ids are never reused across rebuilds, so a
/// late callback for a discarded track set can not land on a new track.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(u64);

impl TrackId {
    fn next() -> Self {
        Self(NEXT_TRACK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrackKind {
    /// An instrument or vocal separation returned by the backend.
    Stem,
    /// A per-speaker split of the vocal stem (diarization).
    Artist,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    /// Backend-relative path, as returned by the separation response.
    pub source_path: String,
    pub source_url: String,
    pub kind: TrackKind,
    /// Display-only `0xRRGGBB` color.
    pub color: u32,
    /// Volume in percent, always within `0..=100`.
    pub volume: u8,
    pub muted: bool,
    pub solo: bool,
}

impl Track {
    fn new(name: String, source_path: &str, base_url: &str, kind: TrackKind, color: u32) -> Self {
        Self {
            id: TrackId::next(),
            name,
            source_path: source_path.to_string(),
            source_url: stem_url(base_url, source_path),
            kind,
            color,
            volume: 100,
            muted: false,
            solo: false,
        }
    }

    /// Normalized gain in `0.0..=1.0`.
    pub fn gain(&self) -> f32 {
        f32::from(self.volume) / 100.0
    }

    /// File name component of the backend path, used when saving the track.
    pub fn file_name(&self) -> &str {
        self.source_path
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("track.wav")
    }
}

const STEM_COLORS: [u32; 6] = [0x22d3ee, 0x06b6d4, 0x0891b2, 0x0e7490, 0x155e75, 0x164e63];
const ARTIST_COLORS: [u32; 6] = [0xf59e0b, 0xf97316, 0xef4444, 0xec4899, 0x8b5cf6, 0x06b6d4];

/// Absolute URL of a backend-relative stem path.
pub fn stem_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/stems/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Build the track set for a separation result.
///
/// When diarization found several artists, vocal stems are replaced by one
/// artist track per detected speaker, in the order the backend sent them.
pub fn build_tracks(result: &SeparationResult, base_url: &str) -> Vec<Track> {
    let split_vocals = result
        .diarization
        .as_ref()
        .is_some_and(|d| d.splits_vocals());

    let mut tracks = Vec::with_capacity(result.stems.len());

    for (index, path) in result.stems.iter().enumerate() {
        let name = stem_display_name(path);
        if split_vocals && name.to_lowercase().contains("vocal") {
            continue;
        }
        let color = STEM_COLORS[index % STEM_COLORS.len()];
        tracks.push(Track::new(name, path, base_url, TrackKind::Stem, color));
    }

    if split_vocals {
        if let Some(diarization) = &result.diarization {
            for (index, (key, path)) in diarization.artists.iter().enumerate() {
                let color = ARTIST_COLORS[index % ARTIST_COLORS.len()];
                tracks.push(Track::new(
                    artist_display_name(key),
                    path,
                    base_url,
                    TrackKind::Artist,
                    color,
                ));
            }
        }
    }

    tracks
}

/// `"stems/lead_vocals.WAV"` -> `"Lead Vocals"`.
pub fn stem_display_name(path: &str) -> String {
    let file_name = path
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown_stem.wav");

    let base = strip_audio_extension(file_name).replace('_', " ");
    title_case(&base)
}

/// `"artist_1"` -> `"🎤 Artist 1"`.
pub fn artist_display_name(key: &str) -> String {
    format!("🎤 {}", key.replacen("artist_", "Artist ", 1))
}

fn strip_audio_extension(name: &str) -> &str {
    if let Some((base, ext)) = name.rsplit_once('.') {
        if ["wav", "mp3", "flac", "ogg"]
            .iter()
            .any(|e| ext.eq_ignore_ascii_case(e))
        {
            return base;
        }
    }
    name
}

/// Uppercase the first character of every run of word characters.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        let is_word = c.is_ascii_alphanumeric() || c == '_';
        if is_word && !in_word {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        in_word = is_word;
    }
    out
}

pub fn any_solo(tracks: &[Track]) -> bool {
    tracks.iter().any(|t| t.solo)
}

/// Effective audibility of `track` given whether any track in its set is solo.
pub fn is_audible(track: &Track, any_solo: bool) -> bool {
    if any_solo {
        track.solo && !track.muted
    } else {
        !track.muted
    }
}

fn replaced(tracks: &[Track], id: TrackId, f: impl Fn(&Track) -> Track) -> Vec<Track> {
    tracks
        .iter()
        .map(|t| if t.id == id { f(t) } else { t.clone() })
        .collect()
}

pub fn with_mute_toggled(tracks: &[Track], id: TrackId) -> Vec<Track> {
    replaced(tracks, id, |t| Track {
        muted: !t.muted,
        ..t.clone()
    })
}

pub fn with_solo_toggled(tracks: &[Track], id: TrackId) -> Vec<Track> {
    replaced(tracks, id, |t| Track {
        solo: !t.solo,
        ..t.clone()
    })
}

/// Volume is clamped to `0..=100`.
pub fn with_volume(tracks: &[Track], id: TrackId, percent: i32) -> Vec<Track> {
    let volume = percent.clamp(0, 100) as u8;
    replaced(tracks, id, |t| Track {
        volume,
        ..t.clone()
    })
}
