//! Carousel controller
//!
//! Owns the track list, the selected index and the drag gesture, and drives a
//! single shared video player. Every index change reloads that player, rewinds
//! the local position, restarts the poll and schedules a metadata refresh
//! after a settle delay. Each refresh is tagged with the epoch of the change
//! that scheduled it and is dropped if another change happened in between.
//!
//! The selection lock is held while the player is loaded, so concurrent
//! changes reach the handle in the same order they were applied to the index.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::video_adapter::VideoAdapter;
use crate::error::{Diagnostics, PlayerError};
use crate::model::{CarouselSnapshot, IndexChange, PlaylistState};
use crate::sdk::{PlayerVars, ScriptRegistry, VideoEvent, VideoPlayerFactory, VideoPlayerOptions, VideoState};

/// Wait after a switch before trusting the player's metadata
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct CarouselController {
    core: VideoAdapter,
    state: Arc<Mutex<PlaylistState>>,
    listener: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl CarouselController {
    pub async fn mount(
        track_ids: Vec<String>,
        factory: Arc<dyn VideoPlayerFactory>,
        registry: ScriptRegistry,
        initial_volume: u8,
        diagnostics: Diagnostics,
    ) -> Result<Self, PlayerError> {
        let state = PlaylistState::new(track_ids)?;
        tracing::info!(tracks = state.len(), "Mounting carousel");

        let controller = Self {
            core: VideoAdapter::new("carousel", initial_volume, diagnostics),
            state: Arc::new(Mutex::new(state)),
            listener: Arc::new(Mutex::new(None)),
        };

        let task = tokio::spawn(controller.clone().run(factory, registry));
        *controller.listener.lock().await = Some(task);
        Ok(controller)
    }

    async fn run(self, factory: Arc<dyn VideoPlayerFactory>, registry: ScriptRegistry) {
        if !self.core.load_sdk(factory.as_ref(), &registry).await {
            return;
        }

        // Whatever is selected by the time the SDK is loaded goes into the player
        let state = self.state.lock().await;
        let options = VideoPlayerOptions {
            video_id: state.current_id().to_string(),
            player_vars: PlayerVars::carousel(),
        };
        let Some(mut events) = self.core.install(factory.as_ref(), options).await else {
            return;
        };
        drop(state);
        self.core.start_polling().await;

        while let Some(event) = events.recv().await {
            match event {
                VideoEvent::Ready => self.core.on_ready().await,
                VideoEvent::StateChange(state) => {
                    self.core.on_state_change(state).await;
                    if state == VideoState::Ended {
                        self.advance().await;
                    }
                }
            }
        }
        tracing::debug!("Carousel event stream closed");
    }

    /// Run one selection transition and apply its change to the shared player
    async fn transition<F>(&self, step: F)
    where
        F: FnOnce(&mut PlaylistState) -> Option<IndexChange>,
    {
        let mut state = self.state.lock().await;
        let Some(change) = step(&mut *state) else {
            return;
        };
        tracing::info!(index = change.index, track_id = %change.track_id, epoch = change.epoch, "Carousel track changed");

        self.core.load_track(&change.track_id).await;
        drop(state);

        if self.core.has_handle().await {
            self.core.start_polling().await;
        }

        let core = self.core.clone();
        let state = self.state.clone();
        let settle_at = Instant::now() + SETTLE_DELAY;
        tokio::spawn(async move {
            tokio::time::sleep_until(settle_at).await;

            let state = state.lock().await;
            if !state.is_current(change.epoch, &change.track_id) {
                tracing::debug!(epoch = change.epoch, track_id = %change.track_id, "Discarding stale metadata refresh");
                return;
            }
            core.refresh_metadata().await;
        });
    }

    /// Track ended: next one, wrapping around
    pub async fn advance(&self) {
        self.transition(|state| Some(state.advance())).await;
    }

    pub async fn select(&self, index: usize) {
        self.transition(|state| state.select(index)).await;
    }

    pub async fn next(&self) {
        self.transition(PlaylistState::next).await;
    }

    pub async fn previous(&self) {
        self.transition(PlaylistState::previous).await;
    }

    pub async fn begin_drag(&self, x: f64) {
        self.state.lock().await.begin_drag(x);
    }

    pub async fn drag_to(&self, x: f64) {
        self.state.lock().await.drag_to(x);
    }

    pub async fn end_drag(&self) {
        self.transition(PlaylistState::end_drag).await;
    }

    pub async fn toggle_play(&self) {
        self.core.toggle_play().await;
    }

    pub async fn toggle_mute(&self) {
        self.core.toggle_mute().await;
    }

    pub async fn set_volume(&self, volume: u8) {
        self.core.set_volume(volume).await;
    }

    pub async fn thumbnail_failed(&self, index: usize) -> bool {
        let mut state = self.state.lock().await;
        match state.thumbnails.get_mut(index) {
            Some(thumbnail) => thumbnail.on_load_error(),
            None => false,
        }
    }

    pub async fn current_index(&self) -> usize {
        self.state.lock().await.current_index()
    }

    pub async fn snapshot(&self) -> CarouselSnapshot {
        let (track_ids, current_index, thumbnails, gesture) = {
            let state = self.state.lock().await;
            (
                state.track_ids().to_vec(),
                state.current_index(),
                state.thumbnails.clone(),
                state.gesture,
            )
        };

        CarouselSnapshot {
            track_ids,
            current_index,
            thumbnails,
            gesture,
            playback: self.core.snapshot().await,
        }
    }

    pub async fn unmount(&self) {
        if let Some(task) = self.listener.lock().await.take() {
            task.abort();
        }
        self.state.lock().await.invalidate();
        self.core.detach().await;
        tracing::info!("Carousel unmounted");
    }
}
