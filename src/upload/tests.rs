use std::fs;
use std::path::Path;

use super::*;
use crate::api::SeparationMode;
use crate::config::{SeparationSettings, UploadSettings};
use crate::error::UploadError;

/// One second of 8 kHz mono 16-bit silence.
fn write_wav(path: &Path) {
    let sample_rate: u32 = 8000;
    let data_len: u32 = sample_rate * 2;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);
    fs::write(path, bytes).unwrap();
}

fn selected(path: &Path) -> SelectedFile {
    SelectedFile {
        path: path.to_path_buf(),
        name: "song.wav".into(),
        size_bytes: 1,
        format: Some("WAV"),
        duration: None,
    }
}

#[test]
fn wav_file_is_detected_from_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.wav");
    write_wav(&path);

    let file = select_file(&path, &UploadSettings::default()).unwrap();
    assert_eq!(file.name, "song.wav");
    assert_eq!(file.format, Some("WAV"));
    assert_eq!(file.size_bytes, 44 + 16000);
}

#[test]
fn content_wins_over_a_misleading_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recording.dat");
    write_wav(&path);

    let file = select_file(&path, &UploadSettings::default()).unwrap();
    assert_eq!(file.format, Some("WAV"));
}

#[test]
fn unknown_content_without_audio_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "just some text, not audio").unwrap();

    let err = select_file(&path, &UploadSettings::default()).unwrap_err();
    assert!(matches!(err, UploadError::UnsupportedFormat { .. }));
    assert!(err.to_string().contains("MP3, WAV, OGG, FLAC"));
}

#[test]
fn oversized_file_is_rejected_with_size_in_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.wav");
    let f = fs::File::create(&path).unwrap();
    f.set_len(3 * 1024 * 1024).unwrap();

    let settings = UploadSettings {
        max_file_mb: 2,
        ..Default::default()
    };
    let err = select_file(&path, &settings).unwrap_err();
    match &err {
        UploadError::TooLarge { size_mb, max_mb } => {
            assert_eq!(*max_mb, 2);
            assert!((size_mb - 3.0).abs() < 1e-9);
        }
        other => panic!("expected TooLarge, got {other:?}"),
    }
    assert_eq!(err.to_string(), "File too large: 3.00 MB. Maximum file size is 2MB");
}

#[test]
fn missing_path_and_directory_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let settings = UploadSettings::default();

    let missing = select_file(&dir.path().join("gone.mp3"), &settings).unwrap_err();
    assert!(matches!(missing, UploadError::NotFound(_)));

    let not_a_file = select_file(dir.path(), &settings).unwrap_err();
    assert!(matches!(not_a_file, UploadError::NotAFile(_)));
}

#[test]
fn switching_to_custom_preselects_vocals_only_when_empty() {
    let mut config = SeparationConfig::default();
    assert_eq!(config.mode(), SeparationMode::FourStem);
    assert!(config.custom_stems().is_empty());

    config.set_mode(SeparationMode::Custom);
    assert_eq!(config.custom_stems(), &["vocals"]);

    config.toggle_stem("vocals");
    config.toggle_stem("piano");
    config.set_mode(SeparationMode::TwoStem);
    config.set_mode(SeparationMode::Custom);
    assert_eq!(config.custom_stems(), &["piano"]);
}

#[test]
fn toggled_stems_stay_in_display_order() {
    let mut config = SeparationConfig::default();
    config.set_mode(SeparationMode::Custom);
    assert!(config.toggle_stem("other"));
    assert!(config.toggle_stem("guitar"));
    assert!(!config.toggle_stem("kazoo"));
    assert_eq!(config.custom_stems(), &["vocals", "guitar", "other"]);
}

#[test]
fn request_requires_a_file() {
    let config = SeparationConfig::default();
    assert_eq!(config.to_request(None).unwrap_err(), NO_FILE_MESSAGE);
}

#[test]
fn custom_request_requires_at_least_one_stem() {
    let mut config = SeparationConfig::default();
    config.set_mode(SeparationMode::Custom);
    config.toggle_stem("vocals");

    let file = selected(Path::new("/tmp/song.wav"));
    assert_eq!(config.to_request(Some(&file)).unwrap_err(), NO_STEMS_MESSAGE);

    config.toggle_stem("drums");
    let request = config.to_request(Some(&file)).unwrap();
    assert_eq!(request.mode, SeparationMode::Custom);
    assert_eq!(request.custom_stems, vec!["drums"]);
    assert!(!request.diarization);
    assert_eq!(request.file, Path::new("/tmp/song.wav"));
}

#[test]
fn diarization_needs_vocals_in_the_separation() {
    let mut config = SeparationConfig::default();
    assert!(config.has_vocals());
    config.set_mode(SeparationMode::TwoStem);
    assert!(config.has_vocals());

    config.set_mode(SeparationMode::Custom);
    config.toggle_stem("vocals");
    config.toggle_stem("guitar");
    assert!(!config.has_vocals());
    assert!(!config.toggle_diarization());
    assert!(!config.diarization());

    let file = selected(Path::new("/tmp/song.wav"));
    let request = config.to_request(Some(&file)).unwrap();
    assert_eq!(request.custom_stems, vec!["guitar"]);
    assert!(!request.diarization);

    config.toggle_stem("vocals");
    assert!(config.toggle_diarization());
    assert!(config.to_request(Some(&file)).unwrap().diarization);
}

#[test]
fn dropping_vocals_withdraws_an_enabled_diarization() {
    let settings = SeparationSettings {
        mode: SeparationMode::Custom,
        custom_stems: vec!["vocals".into(), "bass".into()],
        diarization: true,
    };
    let mut config = SeparationConfig::from_settings(&settings);
    assert!(config.diarization());

    config.toggle_stem("vocals");
    let file = selected(Path::new("/tmp/song.wav"));
    assert!(!config.to_request(Some(&file)).unwrap().diarization);

    // Switching back to a vocal mode restores the choice.
    config.set_mode(SeparationMode::FourStem);
    assert!(config.diarization());
}

#[test]
fn settings_seed_the_form_and_drop_unknown_stems() {
    let settings = SeparationSettings {
        mode: SeparationMode::Custom,
        custom_stems: vec!["Bass".into(), "theremin".into(), "vocals".into()],
        diarization: true,
    };
    let config = SeparationConfig::from_settings(&settings);
    assert_eq!(config.mode(), SeparationMode::Custom);
    assert_eq!(config.custom_stems(), &["vocals", "bass"]);
    assert!(config.diarization());
}
