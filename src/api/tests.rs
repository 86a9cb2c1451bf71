use std::path::PathBuf;

use super::*;
use crate::error::ApiError;

#[test]
fn separation_result_parses_full_response_and_keeps_artist_order() {
    let body = r#"{
        "stems": ["job1/vocals.wav", "job1/drums.wav"],
        "original_audio_path": "job1/song.mp3",
        "diarization": {
            "enabled": true,
            "method": "pyannote",
            "num_artists": 3,
            "artists": {"artist_2": "job1/a2.wav", "artist_0": "job1/a0.wav", "artist_1": "job1/a1.wav"},
            "message": "3 voices"
        }
    }"#;

    let result: SeparationResult = serde_json::from_str(body).unwrap();
    assert_eq!(result.stems, vec!["job1/vocals.wav", "job1/drums.wav"]);
    assert_eq!(result.original_audio_path.as_deref(), Some("job1/song.mp3"));

    let d = result.diarization.unwrap();
    assert!(d.enabled);
    assert_eq!(d.method.as_deref(), Some("pyannote"));
    assert_eq!(d.num_artists, 3);
    let keys: Vec<&str> = d.artists.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["artist_2", "artist_0", "artist_1"]);
    assert_eq!(d.message.as_deref(), Some("3 voices"));
    assert!(d.error.is_none());
    assert!(d.splits_vocals());
}

#[test]
fn separation_result_tolerates_nulls_and_missing_fields() {
    let result: SeparationResult =
        serde_json::from_str(r#"{"stems": null, "diarization": {"enabled": false, "artists": null, "num_artists": null}}"#)
            .unwrap();
    assert!(result.stems.is_empty());
    assert!(result.original_audio_path.is_none());
    let d = result.diarization.unwrap();
    assert!(d.artists.is_empty());
    assert_eq!(d.num_artists, 0);
    assert!(!d.splits_vocals());

    let empty: SeparationResult = serde_json::from_str("{}").unwrap();
    assert!(empty.is_empty());
}

#[test]
fn result_with_only_original_audio_is_not_empty() {
    let result = SeparationResult {
        original_audio_path: Some("job/orig.wav".into()),
        ..Default::default()
    };
    assert!(!result.is_empty());

    let blank = SeparationResult {
        original_audio_path: Some(String::new()),
        ..Default::default()
    };
    assert!(blank.is_empty());
}

#[test]
fn single_artist_diarization_does_not_split_vocals() {
    let d = Diarization {
        enabled: true,
        num_artists: 1,
        artists: vec![("artist_0".into(), "a.wav".into())],
        ..Default::default()
    };
    assert!(!d.splits_vocals());

    let disabled = Diarization {
        enabled: false,
        num_artists: 2,
        artists: vec![("artist_0".into(), "a.wav".into()), ("artist_1".into(), "b.wav".into())],
        ..Default::default()
    };
    assert!(!disabled.splits_vocals());
}

#[test]
fn custom_request_sends_one_selected_stems_field_per_stem() {
    let request = SeparationRequest {
        file: PathBuf::from("/tmp/song.wav"),
        mode: SeparationMode::Custom,
        custom_stems: vec!["vocals".into(), "piano".into()],
        diarization: true,
    };
    assert_eq!(
        request.text_fields(),
        vec![
            ("mode", "custom".to_string()),
            ("enable_diarization", "true".to_string()),
            ("selectedStems", "vocals".to_string()),
            ("selectedStems", "piano".to_string()),
        ]
    );
}

#[test]
fn non_custom_request_omits_selected_stems() {
    let request = SeparationRequest {
        file: PathBuf::from("/tmp/song.wav"),
        mode: SeparationMode::TwoStem,
        custom_stems: vec!["vocals".into()],
        diarization: false,
    };
    assert_eq!(
        request.text_fields(),
        vec![
            ("mode", "2-stem".to_string()),
            ("enable_diarization", "false".to_string()),
        ]
    );
}

#[test]
fn separation_mode_parses_wire_values_and_shorthands() {
    assert_eq!("2-stem".parse::<SeparationMode>().unwrap(), SeparationMode::TwoStem);
    assert_eq!("4".parse::<SeparationMode>().unwrap(), SeparationMode::FourStem);
    assert_eq!("Custom".parse::<SeparationMode>().unwrap(), SeparationMode::Custom);
    assert!("6-stem".parse::<SeparationMode>().is_err());
    assert_eq!(SeparationMode::default(), SeparationMode::FourStem);
}

#[test]
fn error_uses_detail_string_when_present() {
    let err = error_from_response(413, r#"{"detail": "File too large"}"#);
    assert!(matches!(err, ApiError::Http { status: 413, .. }));
    assert_eq!(err.to_string(), "File too large");
}

#[test]
fn error_falls_back_to_status_when_body_unusable() {
    assert_eq!(error_from_response(502, "<html>bad gateway</html>").to_string(), "HTTP error 502");
    assert_eq!(error_from_response(500, r#"{"detail": ""}"#).to_string(), "HTTP error 500");
    // FastAPI validation errors carry a list, not a string.
    assert_eq!(
        error_from_response(422, r#"{"detail": [{"msg": "field required"}]}"#).to_string(),
        "HTTP error 422"
    );
}

#[test]
fn original_audio_url_joins_base_and_path() {
    assert_eq!(
        original_audio_url("http://localhost:8080/", "/job/song.mp3"),
        "http://localhost:8080/original_audio/job/song.mp3"
    );
}
