//! Request and response types of the separation backend.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// How the backend should split the upload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeparationMode {
    #[serde(rename = "2-stem", alias = "2")]
    TwoStem,
    #[default]
    #[serde(rename = "4-stem", alias = "4")]
    FourStem,
    #[serde(rename = "custom")]
    Custom,
}

impl SeparationMode {
    /// Wire value of the `mode` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TwoStem => "2-stem",
            Self::FourStem => "4-stem",
            Self::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TwoStem => "Vocals, Instrumental",
            Self::FourStem => "Vocals, Drums, Bass, Other",
            Self::Custom => "Custom instruments",
        }
    }
}

impl fmt::Display for SeparationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeparationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2-stem" | "2" => Ok(Self::TwoStem),
            "4-stem" | "4" => Ok(Self::FourStem),
            "custom" => Ok(Self::Custom),
            other => Err(format!(
                "unknown separation mode '{other}' (expected 2-stem, 4-stem or custom)"
            )),
        }
    }
}

/// A validated upload, ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct SeparationRequest {
    pub file: PathBuf,
    pub mode: SeparationMode,
    /// Only sent when `mode` is custom.
    pub custom_stems: Vec<String>,
    pub diarization: bool,
}

impl SeparationRequest {
    /// The text fields of the multipart form, in send order. The `file` part
    /// is added separately.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("mode", self.mode.as_str().to_string()),
            ("enable_diarization", self.diarization.to_string()),
        ];
        if self.mode == SeparationMode::Custom {
            fields.extend(
                self.custom_stems
                    .iter()
                    .map(|stem| ("selectedStems", stem.clone())),
            );
        }
        fields
    }
}

/// Successful response of `POST /separate`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SeparationResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub stems: Vec<String>,
    #[serde(default)]
    pub original_audio_path: Option<String>,
    #[serde(default)]
    pub diarization: Option<Diarization>,
}

impl SeparationResult {
    /// No stems and no original audio: nothing to play.
    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
            && self
                .original_audio_path
                .as_deref()
                .is_none_or(str::is_empty)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Diarization {
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_artists: u32,
    /// Artist key to stem path, in the order the backend sent them.
    #[serde(default, deserialize_with = "ordered_map")]
    pub artists: Vec<(String, String)>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Diarization {
    /// Several artists were found and split out of the vocal stem.
    pub fn splits_vocals(&self) -> bool {
        self.enabled && self.num_artists > 1 && !self.artists.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn ordered_map<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedMap;

    impl<'de> Visitor<'de> for OrderedMap {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of artist keys to stem paths")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, path)) = map.next_entry::<String, String>()? {
                entries.push((key, path));
            }
            Ok(entries)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(OrderedMap)
}
