//! Video player SDK boundary
//!
//! Everything the adapters know about the embedded video widget goes through
//! [`VideoHandle`]. Implementations are expected to answer reads from their
//! last known state without blocking.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::PlayerError;

/// Playback states reported by the widget
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl VideoState {
    #[cfg(test)]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(VideoState::Unstarted),
            0 => Some(VideoState::Ended),
            1 => Some(VideoState::Playing),
            2 => Some(VideoState::Paused),
            3 => Some(VideoState::Buffering),
            5 => Some(VideoState::Cued),
            _ => None,
        }
    }

    /// The widget's numeric state code
    pub fn code(self) -> i32 {
        match self {
            VideoState::Unstarted => -1,
            VideoState::Ended => 0,
            VideoState::Playing => 1,
            VideoState::Paused => 2,
            VideoState::Buffering => 3,
            VideoState::Cued => 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoEvent {
    Ready,
    StateChange(VideoState),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VideoData {
    pub video_id: String,
    pub title: String,
}

/// Widget embed parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerVars {
    pub autoplay: u8,
    pub controls: u8,
    pub modestbranding: u8,
    pub rel: u8,
    #[serde(rename = "loop")]
    pub loop_playback: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist: Option<String>,
    pub mute: u8,
}

impl PlayerVars {
    /// Single video on repeat. The widget only loops when the video is also its own playlist.
    pub fn looping(video_id: &str) -> Self {
        Self {
            autoplay: 1,
            controls: 0,
            modestbranding: 1,
            rel: 0,
            loop_playback: 1,
            playlist: Some(video_id.to_string()),
            mute: 1,
        }
    }

    /// Carousel playback, the controller decides what comes next
    pub fn carousel() -> Self {
        Self {
            autoplay: 1,
            controls: 0,
            modestbranding: 1,
            rel: 0,
            loop_playback: 0,
            playlist: None,
            mute: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoPlayerOptions {
    pub video_id: String,
    pub player_vars: PlayerVars,
}

/// Capability surface of one live video player
pub trait VideoHandle: Send + Sync {
    fn play_video(&self);
    fn pause_video(&self);
    fn mute(&self);
    fn unmute(&self);
    fn set_volume(&self, volume: u8);
    /// Seconds
    fn current_time(&self) -> f64;
    /// Seconds, 0 while metadata is not available
    fn duration(&self) -> f64;
    fn video_data(&self) -> VideoData;
    fn load_video_by_id(&self, video_id: &str);
    fn destroy(&self);
}

pub struct VideoPlayer {
    pub handle: Arc<dyn VideoHandle>,
    pub events: mpsc::UnboundedReceiver<VideoEvent>,
}

/// Constructor side of the video SDK
pub trait VideoPlayerFactory: Send + Sync {
    fn script_url(&self) -> &str;

    fn load_script(&self) -> BoxFuture<'static, Result<(), String>>;

    fn create(&self, options: VideoPlayerOptions) -> Result<VideoPlayer, PlayerError>;
}
