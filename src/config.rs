//! Environment-derived configuration
//!
//! Everything the host page needs comes from the process environment. The
//! parsing works on any `(key, value)` iterator so it can be exercised without
//! touching the real environment.

use std::collections::HashMap;

use crate::error::PlayerError;
use crate::model::DEFAULT_VOLUME_PERCENT;

const DEFAULT_TRACKS: &[&str] = &["dQw4w9WgXcQ", "kJQP7kiw5Fk", "9bZkp7q5f6w"];
const DEFAULT_STREAM_VOLUME: f32 = 0.5;
pub const DEFAULT_DEVICE_NAME: &str = "Landing-Player";

/// One carousel entry: `id` or `id=Title@seconds`
#[derive(Clone, Debug, PartialEq)]
pub struct TrackEntry {
    pub id: String,
    pub title: Option<String>,
    pub duration_secs: Option<f64>,
}

impl TrackEntry {
    pub fn parse(raw: &str) -> Result<Self, PlayerError> {
        let raw = raw.trim();
        let (id, rest) = match raw.split_once('=') {
            Some((id, rest)) => (id.trim(), Some(rest)),
            None => (raw, None),
        };

        if id.is_empty() {
            return Err(PlayerError::Configuration(format!("empty track id in '{}'", raw)));
        }

        let (title, duration_secs) = match rest {
            None => (None, None),
            Some(rest) => match rest.rsplit_once('@') {
                Some((title, secs)) => {
                    let secs: f64 = secs.trim().parse().map_err(|_| {
                        PlayerError::Configuration(format!("bad duration in '{}'", raw))
                    })?;
                    if secs <= 0.0 {
                        return Err(PlayerError::Configuration(format!(
                            "duration must be positive in '{}'",
                            raw
                        )));
                    }
                    (Some(title.trim().to_string()), Some(secs))
                }
                None => (Some(rest.trim().to_string()), None),
            },
        };

        Ok(Self {
            id: id.to_string(),
            title: title.filter(|t| !t.is_empty()),
            duration_secs,
        })
    }
}

/// Which video surface the host page mounts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VideoMode {
    #[default]
    Carousel,
    /// First configured track on repeat
    Single,
}

impl VideoMode {
    fn parse(raw: &str) -> Result<Self, PlayerError> {
        match raw.to_ascii_lowercase().as_str() {
            "carousel" => Ok(VideoMode::Carousel),
            "single" => Ok(VideoMode::Single),
            other => Err(PlayerError::Configuration(format!("unknown LANDING_MODE: {}", other))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StreamingConfig {
    pub access_token: String,
    pub context_uri: Option<String>,
    pub device_name: String,
    pub volume: f32,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mode: VideoMode,
    pub tracks: Vec<TrackEntry>,
    pub volume: u8,
    pub streaming: Option<StreamingConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, PlayerError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, PlayerError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let tracks = match get("LANDING_TRACKS") {
            Some(list) => list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(TrackEntry::parse)
                .collect::<Result<Vec<_>, _>>()?,
            None => DEFAULT_TRACKS
                .iter()
                .map(|id| TrackEntry {
                    id: id.to_string(),
                    title: None,
                    duration_secs: None,
                })
                .collect(),
        };

        if tracks.is_empty() {
            return Err(PlayerError::Configuration("LANDING_TRACKS has no entries".into()));
        }

        let mode = match get("LANDING_MODE") {
            Some(mode) => VideoMode::parse(&mode)?,
            None => VideoMode::default(),
        };

        let volume = match get("LANDING_VOLUME") {
            Some(v) => v
                .parse::<u8>()
                .ok()
                .filter(|v| *v <= 100)
                .ok_or_else(|| PlayerError::Configuration(format!("LANDING_VOLUME out of range: {}", v)))?,
            None => DEFAULT_VOLUME_PERCENT,
        };

        let streaming = match get("SPOTIFY_ACCESS_TOKEN") {
            Some(access_token) => {
                let volume = match get("LANDING_STREAM_VOLUME") {
                    Some(v) => v
                        .parse::<f32>()
                        .ok()
                        .filter(|v| (0.0..=1.0).contains(v))
                        .ok_or_else(|| {
                            PlayerError::Configuration(format!("LANDING_STREAM_VOLUME out of range: {}", v))
                        })?,
                    None => DEFAULT_STREAM_VOLUME,
                };
                Some(StreamingConfig {
                    access_token,
                    context_uri: get("SPOTIFY_CONTEXT_URI"),
                    device_name: get("LANDING_DEVICE_NAME").unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_string()),
                    volume,
                })
            }
            None => None,
        };

        Ok(Self {
            mode,
            tracks,
            volume,
            streaming,
        })
    }

    pub fn track_ids(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.id.clone()).collect()
    }
}
