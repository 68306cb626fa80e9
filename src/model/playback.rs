//! Playback snapshot of the embedded video player

pub const DEFAULT_VOLUME_PERCENT: u8 = 50;

/// What the UI knows about the video player, refreshed by events and polling
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    /// Seconds
    pub current_time: f64,
    /// Seconds, 0 until the player published metadata
    pub duration: f64,
    pub title: String,
    /// 0 - 100
    pub volume: u8,
    pub is_muted: bool,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            title: String::new(),
            volume: DEFAULT_VOLUME_PERCENT,
            is_muted: false,
        }
    }
}

impl PlaybackSnapshot {
    pub fn progress_ratio(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Output is silent either when muted or at zero volume
    pub fn is_silent(&self) -> bool {
        self.is_muted || self.volume == 0
    }
}
