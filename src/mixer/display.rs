//! Pure display derivations for the results view.

pub const WAVEFORM_BARS: usize = 40;

/// Playback progress in percent, clamped to `0..=100`.
pub fn progress_percent(position: f64, duration: f64) -> f64 {
    if !(duration > 0.0) || !(position > 0.0) {
        return 0.0;
    }
    (position / duration * 100.0).clamp(0.0, 100.0)
}

/// Decorative bar heights (percent) for the lane of the track at `track_index`.
///
/// Not derived from audio; stable for a given index.
pub fn waveform_bars(track_index: usize) -> [f64; WAVEFORM_BARS] {
    let t = track_index as f64;
    std::array::from_fn(|i| {
        let i = i as f64;
        let base = 25.0 + t * 3.0;
        let variation = ((i + t) * 0.3).sin() * 10.0 + (i * 0.8).sin() * 5.0;
        (base + variation).clamp(15.0, 85.0)
    })
}

/// Number of leading bars drawn as already played.
pub fn played_bars(progress_percent: f64, bars: usize) -> usize {
    let edge = progress_percent / 100.0 * bars as f64;
    (0..bars).filter(|&i| (i as f64) < edge).count()
}

/// Map a horizontal offset inside a timeline of `width` to a fraction in `0..=1`.
pub fn timeline_fraction(offset: f64, width: f64) -> f64 {
    if !(width > 0.0) || offset.is_nan() {
        return 0.0;
    }
    (offset / width).clamp(0.0, 1.0)
}

/// Format seconds as `m:ss`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{minutes}:{secs:02}")
}
