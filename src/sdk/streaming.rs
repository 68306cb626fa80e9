//! Streaming-audio SDK boundary
//!
//! The payload types mirror the playback state object the streaming SDK hands
//! to its `player_state_changed` listeners, so fixtures can be written as the
//! SDK's own JSON.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::PlayerError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkImage {
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkArtist {
    pub name: String,
    #[serde(default)]
    pub uri: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkAlbum {
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub images: Vec<SdkImage>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkTrack {
    #[serde(default)]
    pub id: Option<String>,
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SdkArtist>,
    #[serde(default)]
    pub album: SdkAlbum,
    #[serde(default)]
    pub duration_ms: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackWindow {
    pub current_track: Option<SdkTrack>,
    #[serde(default)]
    pub previous_tracks: Vec<SdkTrack>,
    #[serde(default)]
    pub next_tracks: Vec<SdkTrack>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkPlaybackState {
    pub paused: bool,
    /// Milliseconds
    pub position: u32,
    /// Milliseconds
    pub duration: u32,
    pub track_window: TrackWindow,
}

/// Named events emitted by a streaming connection
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SdkEvent {
    Ready { device_id: String },
    NotReady { device_id: String },
    PlayerStateChanged(Option<SdkPlaybackState>),
    InitializationError(String),
    AuthenticationError(String),
    AccountError(String),
    PlaybackError(String),
}

impl SdkEvent {
    /// The error carried by one of the four error events
    pub fn as_error(&self) -> Option<PlayerError> {
        match self {
            SdkEvent::InitializationError(m) => Some(PlayerError::Initialization(m.clone())),
            SdkEvent::AuthenticationError(m) => Some(PlayerError::Authentication(m.clone())),
            SdkEvent::AccountError(m) => Some(PlayerError::Account(m.clone())),
            SdkEvent::PlaybackError(m) => Some(PlayerError::NetworkOrPlayback(m.clone())),
            _ => None,
        }
    }
}

pub type TokenProvider = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct StreamingOptions {
    pub name: String,
    pub get_oauth_token: TokenProvider,
    /// 0.0 - 1.0
    pub volume: f32,
}

/// Commands accepted by a connected streaming player
#[async_trait]
pub trait StreamingTransport: Send + Sync {
    async fn toggle_play(&self) -> Result<(), PlayerError>;
    async fn next_track(&self) -> Result<(), PlayerError>;
    async fn previous_track(&self) -> Result<(), PlayerError>;
    async fn seek(&self, position_ms: u32) -> Result<(), PlayerError>;
    async fn set_volume(&self, volume: f32) -> Result<(), PlayerError>;
    async fn disconnect(&self);
}

pub struct StreamingConnection {
    pub transport: Arc<dyn StreamingTransport>,
    pub events: mpsc::UnboundedReceiver<SdkEvent>,
}

#[async_trait]
pub trait StreamingSdk: Send + Sync {
    fn script_url(&self) -> &str;

    fn load_script(&self) -> BoxFuture<'static, Result<(), String>>;

    async fn connect(&self, options: StreamingOptions) -> Result<StreamingConnection, PlayerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_sdk_state_payload() {
        let payload = r#"{
            "paused": false,
            "position": 41000,
            "duration": 215000,
            "track_window": {
                "current_track": {
                    "id": "4uLU6hMCjMI75M1A2tKUQC",
                    "uri": "spotify:track:4uLU6hMCjMI75M1A2tKUQC",
                    "name": "Never Gonna Give You Up",
                    "artists": [{ "name": "Rick Astley", "uri": "spotify:artist:0gxyHStUsqpMadRV0Di1Qt" }],
                    "album": {
                        "name": "Whenever You Need Somebody",
                        "uri": "spotify:album:6XhjNHCyCDyyGJRM5mg40G",
                        "images": [{ "url": "https://i.scdn.co/image/cover" }]
                    },
                    "duration_ms": 215000
                },
                "previous_tracks": [],
                "next_tracks": []
            }
        }"#;

        let state: SdkPlaybackState = serde_json::from_str(payload).unwrap();
        let track = state.track_window.current_track.unwrap();
        assert_eq!(state.position, 41000);
        assert_eq!(track.artists[0].name, "Rick Astley");
        assert_eq!(track.album.images[0].url, "https://i.scdn.co/image/cover");
    }

    #[test]
    fn error_events_map_onto_taxonomy() {
        assert_eq!(
            SdkEvent::AccountError("premium".into()).as_error(),
            Some(PlayerError::Account("premium".into()))
        );
        assert_eq!(SdkEvent::PlayerStateChanged(None).as_error(), None);
    }
}
