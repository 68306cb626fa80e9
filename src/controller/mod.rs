//! Controller module - adapters and host-page coordination
//!
//! This module owns everything that drives the external players and turns
//! user input into commands. It is organized into submodules by
//! responsibility:
//!
//! - `poller`: cancellable periodic task
//! - `video_adapter`: shared handle, snapshot and poll of a video player
//! - `single`: single-track adapter (one video on repeat)
//! - `carousel`: carousel controller over one shared video player
//! - `streaming`: streaming-audio adapter
//! - `autostart`: contextual play once the streaming device is ready
//! - `input`: key and mouse handling for the host page

mod poller;
mod video_adapter;
mod single;
mod carousel;
mod streaming;
mod autostart;
mod input;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::Diagnostics;
use crate::model::{CarouselSnapshot, GestureState, PageSnapshot};

pub use single::SingleTrackAdapter;
pub use carousel::CarouselController;
pub use streaming::StreamingAdapter;
pub use autostart::AutoStart;

/// The video player the host page shows
#[derive(Clone)]
pub enum VideoSurface {
    Carousel(CarouselController),
    Single(SingleTrackAdapter),
}

impl VideoSurface {
    pub async fn toggle_play(&self) {
        match self {
            VideoSurface::Carousel(c) => c.toggle_play().await,
            VideoSurface::Single(s) => s.toggle_play().await,
        }
    }

    pub async fn toggle_mute(&self) {
        match self {
            VideoSurface::Carousel(c) => c.toggle_mute().await,
            VideoSurface::Single(s) => s.toggle_mute().await,
        }
    }

    pub async fn set_volume(&self, volume: u8) {
        match self {
            VideoSurface::Carousel(c) => c.set_volume(volume).await,
            VideoSurface::Single(s) => s.set_volume(volume).await,
        }
    }

    /// The current track's thumbnail failed to load
    pub async fn thumbnail_failed(&self) -> bool {
        match self {
            VideoSurface::Carousel(c) => c.thumbnail_failed(c.current_index().await).await,
            VideoSurface::Single(s) => s.thumbnail_failed().await,
        }
    }

    /// A single track renders as a one-card carousel
    pub async fn snapshot(&self) -> CarouselSnapshot {
        match self {
            VideoSurface::Carousel(c) => c.snapshot().await,
            VideoSurface::Single(s) => CarouselSnapshot {
                track_ids: vec![s.track_id().to_string()],
                current_index: 0,
                thumbnails: vec![s.thumbnail().await],
                gesture: GestureState::default(),
                playback: s.snapshot().await,
            },
        }
    }

    pub fn carousel(&self) -> Option<&CarouselController> {
        match self {
            VideoSurface::Carousel(c) => Some(c),
            VideoSurface::Single(_) => None,
        }
    }

    pub async fn unmount(&self) {
        match self {
            VideoSurface::Carousel(c) => c.unmount().await,
            VideoSurface::Single(s) => s.unmount().await,
        }
    }
}

#[derive(Clone)]
pub struct AppController {
    pub(crate) video: VideoSurface,
    pub(crate) streaming: Option<StreamingAdapter>,
    pub(crate) diagnostics: Diagnostics,
    autostart: Arc<Mutex<Option<JoinHandle<()>>>>,
    should_quit: Arc<Mutex<bool>>,
}

impl AppController {
    pub fn new(video: VideoSurface, streaming: Option<StreamingAdapter>, diagnostics: Diagnostics) -> Self {
        Self {
            video,
            streaming,
            diagnostics,
            autostart: Arc::new(Mutex::new(None)),
            should_quit: Arc::new(Mutex::new(false)),
        }
    }

    /// Start auto-play on the streaming device, if there is one
    pub async fn enable_autostart(&self, autostart: AutoStart) {
        let Some(streaming) = &self.streaming else {
            tracing::debug!("No streaming player, auto-start skipped");
            return;
        };

        let task = autostart.spawn(streaming.subscribe());
        if let Some(previous) = self.autostart.lock().await.replace(task) {
            previous.abort();
        }
    }

    pub async fn page_snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            carousel: self.video.snapshot().await,
            streaming: self.streaming.as_ref().map(|s| s.snapshot()),
            diagnostic: self.diagnostics.current(),
        }
    }

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub(crate) async fn quit(&self) {
        *self.should_quit.lock().await = true;
    }

    /// Unmount both players
    pub async fn shutdown(&self) {
        if let Some(task) = self.autostart.lock().await.take() {
            task.abort();
        }
        if let Some(streaming) = &self.streaming {
            streaming.unmount().await;
        }
        self.video.unmount().await;
        tracing::info!("Players unmounted");
    }
}
