//! Single-track adapter: one video on repeat

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::video_adapter::VideoAdapter;
use crate::error::Diagnostics;
use crate::model::{PlaybackSnapshot, Thumbnail};
use crate::sdk::{PlayerVars, ScriptRegistry, VideoEvent, VideoPlayerFactory, VideoPlayerOptions, VideoState};

#[derive(Clone)]
pub struct SingleTrackAdapter {
    track_id: String,
    core: VideoAdapter,
    thumbnail: Arc<Mutex<Thumbnail>>,
    listener: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SingleTrackAdapter {
    /// Create the adapter and attach it to the SDK in the background
    pub async fn mount(
        track_id: &str,
        factory: Arc<dyn VideoPlayerFactory>,
        registry: ScriptRegistry,
        initial_volume: u8,
        diagnostics: Diagnostics,
    ) -> Self {
        let adapter = Self {
            track_id: track_id.to_string(),
            core: VideoAdapter::new("single", initial_volume, diagnostics),
            thumbnail: Arc::new(Mutex::new(Thumbnail::for_video(track_id))),
            listener: Arc::new(Mutex::new(None)),
        };

        let task = tokio::spawn(adapter.clone().run(factory, registry));
        *adapter.listener.lock().await = Some(task);
        adapter
    }

    async fn run(self, factory: Arc<dyn VideoPlayerFactory>, registry: ScriptRegistry) {
        if !self.core.load_sdk(factory.as_ref(), &registry).await {
            return;
        }

        let options = VideoPlayerOptions {
            video_id: self.track_id.clone(),
            player_vars: PlayerVars::looping(&self.track_id),
        };
        let Some(mut events) = self.core.install(factory.as_ref(), options).await else {
            return;
        };
        self.core.start_polling().await;

        while let Some(event) = events.recv().await {
            match event {
                VideoEvent::Ready => self.core.on_ready().await,
                VideoEvent::StateChange(state) => {
                    self.core.on_state_change(state).await;
                    if state == VideoState::Ended {
                        tracing::debug!(track_id = %self.track_id, "Track ended, looping");
                        self.core.play().await;
                    }
                }
            }
        }
        tracing::debug!(track_id = %self.track_id, "Video event stream closed");
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
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

    pub async fn snapshot(&self) -> PlaybackSnapshot {
        self.core.snapshot().await
    }

    pub async fn thumbnail(&self) -> Thumbnail {
        self.thumbnail.lock().await.clone()
    }

    pub async fn thumbnail_url(&self) -> String {
        self.thumbnail.lock().await.url()
    }

    /// The thumbnail failed to load, switch to the fallback image
    pub async fn thumbnail_failed(&self) -> bool {
        self.thumbnail.lock().await.on_load_error()
    }

    pub async fn unmount(&self) {
        if let Some(task) = self.listener.lock().await.take() {
            task.abort();
        }
        self.core.detach().await;
        tracing::info!(track_id = %self.track_id, "Single-track adapter unmounted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing::{flush, FakeVideoFactory};
    use crate::controller::video_adapter::POLL_INTERVAL;
    use crate::error::PlayerError;

    async fn mounted(factory: &Arc<FakeVideoFactory>) -> SingleTrackAdapter {
        let adapter = SingleTrackAdapter::mount(
            "loop-me",
            factory.clone(),
            ScriptRegistry::new(),
            60,
            Diagnostics::new(),
        )
        .await;
        flush().await;
        adapter
    }

    #[tokio::test(start_paused = true)]
    async fn creates_a_looping_player() {
        let factory = Arc::new(FakeVideoFactory::new());
        let adapter = mounted(&factory).await;

        let created = factory.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].video_id, "loop-me");
        assert_eq!(created[0].player_vars, PlayerVars::looping("loop-me"));
        assert_eq!(adapter.track_id(), "loop-me");
    }

    #[tokio::test(start_paused = true)]
    async fn ended_replays_the_same_track() {
        let factory = Arc::new(FakeVideoFactory::new());
        factory.handle.set_metadata("loop-me", "Loop", 30.0);
        let adapter = mounted(&factory).await;

        factory.send(VideoEvent::Ready);
        flush().await;
        assert_eq!(factory.handle.play_calls(), 1);
        let snapshot = adapter.snapshot().await;
        assert_eq!(snapshot.title, "Loop");
        assert_eq!(snapshot.volume, 60);
        assert!(snapshot.is_muted);

        factory.send(VideoEvent::StateChange(VideoState::Playing));
        factory.send(VideoEvent::StateChange(VideoState::Ended));
        flush().await;

        assert_eq!(factory.handle.play_calls(), 2);
        assert!(factory.handle.loaded().is_empty());
        assert_eq!(factory.created().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_play_pauses_and_resumes() {
        let factory = Arc::new(FakeVideoFactory::new());
        let adapter = mounted(&factory).await;
        factory.send(VideoEvent::Ready);
        factory.send(VideoEvent::StateChange(VideoState::Playing));
        flush().await;

        adapter.toggle_play().await;
        assert_eq!(factory.handle.pause_calls(), 1);
        assert!(!adapter.snapshot().await.is_playing);

        adapter.toggle_play().await;
        assert!(adapter.snapshot().await.is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_polled_every_second() {
        let factory = Arc::new(FakeVideoFactory::new());
        let adapter = mounted(&factory).await;

        factory.handle.set_current_time(7.5);
        tokio::time::advance(POLL_INTERVAL).await;
        flush().await;
        assert_eq!(adapter.snapshot().await.current_time, 7.5);

        adapter.unmount().await;
        factory.handle.set_current_time(20.0);
        tokio::time::advance(POLL_INTERVAL * 2).await;
        flush().await;
        assert_eq!(adapter.snapshot().await.current_time, 7.5);
        assert!(factory.handle.is_destroyed());
    }

    #[tokio::test(start_paused = true)]
    async fn script_failure_is_reported_and_commands_stay_noops() {
        let factory = Arc::new(FakeVideoFactory::with_script_error("blocked by client"));
        let diagnostics = Diagnostics::new();
        let adapter = SingleTrackAdapter::mount(
            "x",
            factory.clone(),
            ScriptRegistry::new(),
            50,
            diagnostics.clone(),
        )
        .await;
        flush().await;

        assert!(factory.created().is_empty());
        assert_eq!(
            diagnostics.history(),
            vec![PlayerError::Initialization("blocked by client".into())]
        );

        adapter.toggle_play().await;
        adapter.set_volume(10).await;
        assert_eq!(adapter.snapshot().await.volume, 50);
    }

    #[tokio::test]
    async fn thumbnail_falls_back_to_hq() {
        let factory = Arc::new(FakeVideoFactory::new());
        let adapter = mounted(&factory).await;

        assert!(adapter.thumbnail_url().await.ends_with("/loop-me/maxresdefault.jpg"));
        assert!(adapter.thumbnail_failed().await);
        assert!(adapter.thumbnail_url().await.ends_with("/loop-me/hqdefault.jpg"));
    }
}
