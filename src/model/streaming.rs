//! Streaming player state, driven only by SDK events

use crate::sdk::{SdkEvent, SdkTrack};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackDescriptor {
    pub id: Option<String>,
    pub uri: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub album_art: Option<String>,
    pub duration_ms: u32,
}

impl From<&SdkTrack> for TrackDescriptor {
    fn from(track: &SdkTrack) -> Self {
        Self {
            id: track.id.clone(),
            uri: track.uri.clone(),
            name: track.name.clone(),
            artists: track.artists.iter().map(|a| a.name.clone()).collect(),
            album: track.album.name.clone(),
            album_art: track.album.images.first().map(|i| i.url.clone()),
            duration_ms: track.duration_ms,
        }
    }
}

impl TrackDescriptor {
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamingPlayerState {
    pub is_ready: bool,
    pub is_active: bool,
    pub is_paused: bool,
    pub device_id: Option<String>,
    pub current_track: Option<TrackDescriptor>,
    /// Milliseconds, as of the last state change
    pub position: u32,
    /// Milliseconds
    pub duration: u32,
}

/// Nothing plays until the first state change says otherwise
impl Default for StreamingPlayerState {
    fn default() -> Self {
        Self {
            is_ready: false,
            is_active: false,
            is_paused: true,
            device_id: None,
            current_track: None,
            position: 0,
            duration: 0,
        }
    }
}

impl StreamingPlayerState {
    /// Apply one SDK event. Returns whether anything changed.
    ///
    /// Error events never touch the state; reporting them is the adapter's job.
    pub fn apply(&mut self, event: &SdkEvent) -> bool {
        let before = self.clone();

        match event {
            SdkEvent::Ready { device_id } => {
                self.is_ready = true;
                if self.device_id.is_none() {
                    self.device_id = Some(device_id.clone());
                } else if self.device_id.as_deref() != Some(device_id.as_str()) {
                    tracing::warn!(device_id = %device_id, "Ignoring device id from repeated ready event");
                }
            }
            SdkEvent::NotReady { device_id } => {
                tracing::info!(device_id = %device_id, "Streaming device went offline");
                self.is_ready = false;
            }
            SdkEvent::PlayerStateChanged(None) => {}
            SdkEvent::PlayerStateChanged(Some(state)) => {
                self.is_active = true;
                self.is_paused = state.paused;
                self.current_track = state.track_window.current_track.as_ref().map(TrackDescriptor::from);
                self.position = state.position;
                self.duration = state.duration;
            }
            SdkEvent::InitializationError(_)
            | SdkEvent::AuthenticationError(_)
            | SdkEvent::AccountError(_)
            | SdkEvent::PlaybackError(_) => {}
        }

        *self != before
    }
}
