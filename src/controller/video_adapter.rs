//! Shared core of the video adapters
//!
//! Owns the one external player handle, the playback snapshot and the
//! position poll. The single-track adapter and the carousel both drive their
//! player through this type and only differ in what they do around it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use super::poller::Poller;
use crate::error::{Diagnostics, PlayerError};
use crate::model::PlaybackSnapshot;
use crate::sdk::{
    ScriptRegistry, VideoEvent, VideoHandle, VideoPlayer, VideoPlayerFactory, VideoPlayerOptions,
    VideoState,
};

/// How often the player is asked for its position
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

type HandleSlot = Arc<Mutex<Option<Arc<dyn VideoHandle>>>>;

#[derive(Clone)]
pub struct VideoAdapter {
    source: &'static str,
    initial_volume: u8,
    handle: HandleSlot,
    playback: Arc<Mutex<PlaybackSnapshot>>,
    poller: Arc<Mutex<Option<Poller>>>,
    diagnostics: Diagnostics,
}

impl VideoAdapter {
    pub fn new(source: &'static str, initial_volume: u8, diagnostics: Diagnostics) -> Self {
        let initial_volume = initial_volume.min(100);
        Self {
            source,
            initial_volume,
            handle: Arc::new(Mutex::new(None)),
            playback: Arc::new(Mutex::new(PlaybackSnapshot {
                volume: initial_volume,
                ..Default::default()
            })),
            poller: Arc::new(Mutex::new(None)),
            diagnostics,
        }
    }

    /// Wait for the SDK script. Reports and returns false if it failed to load.
    pub async fn load_sdk(&self, factory: &dyn VideoPlayerFactory, registry: &ScriptRegistry) -> bool {
        let load = registry.ensure_loaded(factory.script_url(), || factory.load_script());
        match load.await {
            Ok(()) => true,
            Err(e) => {
                self.diagnostics
                    .report(self.source, PlayerError::Initialization(e.to_string()));
                false
            }
        }
    }

    /// Create the external player. There is never more than one per adapter.
    pub async fn install(
        &self,
        factory: &dyn VideoPlayerFactory,
        options: VideoPlayerOptions,
    ) -> Option<mpsc::UnboundedReceiver<VideoEvent>> {
        let mut slot = self.handle.lock().await;
        if slot.is_some() {
            tracing::warn!(source = self.source, "Video player already created");
            return None;
        }

        let video_id = options.video_id.clone();
        match factory.create(options) {
            Ok(VideoPlayer { handle, events }) => {
                tracing::info!(source = self.source, video_id = %video_id, "Video player created");
                *slot = Some(handle);
                Some(events)
            }
            Err(e) => {
                self.diagnostics.report(self.source, e);
                None
            }
        }
    }

    /// The live handle, or None (reported as not-ready) before creation
    async fn current_handle(&self) -> Option<Arc<dyn VideoHandle>> {
        let handle = self.handle.lock().await.clone();
        if handle.is_none() {
            self.diagnostics
                .report(self.source, PlayerError::SdkNotReady("video player"));
        }
        handle
    }

    pub async fn has_handle(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    pub async fn snapshot(&self) -> PlaybackSnapshot {
        self.playback.lock().await.clone()
    }

    /// Player finished booting: take metadata, start muted (autoplay needs it) and play
    pub async fn on_ready(&self) {
        let Some(handle) = self.current_handle().await else {
            return;
        };

        let data = handle.video_data();
        let duration = handle.duration();
        handle.mute();
        handle.set_volume(self.initial_volume);

        {
            let mut playback = self.playback.lock().await;
            playback.duration = duration;
            playback.title = data.title;
            playback.volume = self.initial_volume;
            playback.is_muted = true;
        }

        handle.play_video();
        tracing::info!(source = self.source, video_id = %data.video_id, duration, "Video player ready");
    }

    pub async fn on_state_change(&self, state: VideoState) {
        // Only PLAYING counts as playing; buffering and cued states read as stopped
        let is_playing = state == VideoState::Playing;
        tracing::debug!(source = self.source, ?state, code = state.code(), "Player state changed");
        self.playback.lock().await.is_playing = is_playing;
    }

    pub async fn play(&self) {
        if let Some(handle) = self.current_handle().await {
            handle.play_video();
        }
    }

    pub async fn toggle_play(&self) {
        let Some(handle) = self.current_handle().await else {
            return;
        };

        let mut playback = self.playback.lock().await;
        if playback.is_playing {
            handle.pause_video();
            playback.is_playing = false;
        } else {
            handle.play_video();
            playback.is_playing = true;
        }
        tracing::debug!(source = self.source, is_playing = playback.is_playing, "Playback toggled");
    }

    /// Unmuting at volume 0 keeps the output muted
    pub async fn toggle_mute(&self) {
        let Some(handle) = self.current_handle().await else {
            return;
        };

        let mut playback = self.playback.lock().await;
        if playback.is_muted {
            if playback.volume == 0 {
                tracing::debug!(source = self.source, "Volume is 0, staying muted");
                return;
            }
            handle.unmute();
            playback.is_muted = false;
        } else {
            handle.mute();
            playback.is_muted = true;
        }
    }

    /// Volume 0 mutes, anything above unmutes
    pub async fn set_volume(&self, volume: u8) {
        let Some(handle) = self.current_handle().await else {
            return;
        };

        let volume = volume.min(100);
        handle.set_volume(volume);

        let mut playback = self.playback.lock().await;
        playback.volume = volume;
        if volume == 0 {
            handle.mute();
            playback.is_muted = true;
        } else if playback.is_muted {
            handle.unmute();
            playback.is_muted = false;
        }
        tracing::debug!(source = self.source, volume, muted = playback.is_muted, "Volume set");
    }

    /// Load another video into the existing handle and rewind the local position.
    ///
    /// Without a handle only the position is reset; the player picks up the
    /// current track when it gets created.
    pub async fn load_track(&self, video_id: &str) {
        if let Some(handle) = self.handle.lock().await.clone() {
            handle.load_video_by_id(video_id);
            tracing::debug!(source = self.source, video_id, "Loaded video into player");
        }
        self.playback.lock().await.current_time = 0.0;
    }

    /// Take duration and title from the player as they are right now
    pub async fn refresh_metadata(&self) {
        let Some(handle) = self.handle.lock().await.clone() else {
            return;
        };
        let duration = handle.duration();
        let title = handle.video_data().title;

        let mut playback = self.playback.lock().await;
        playback.duration = duration;
        playback.title = title;
        tracing::debug!(source = self.source, duration, title = %playback.title, "Metadata refreshed");
    }

    /// (Re)start the position poll. Any running poll is cancelled first.
    pub async fn start_polling(&self) {
        let handle = self.handle.clone();
        let playback = self.playback.clone();
        let source = self.source;

        let poller = Poller::spawn(POLL_INTERVAL, move || {
            let handle = handle.clone();
            let playback = playback.clone();
            async move { poll_tick(source, &handle, &playback).await }
        });

        if let Some(previous) = self.poller.lock().await.replace(poller) {
            previous.cancel();
        }
    }

    pub async fn stop_polling(&self) {
        if let Some(poller) = self.poller.lock().await.take() {
            poller.cancel();
        }
    }

    /// Tear down: stop polling and destroy the external player
    pub async fn detach(&self) {
        self.stop_polling().await;
        if let Some(handle) = self.handle.lock().await.take() {
            handle.destroy();
            tracing::info!(source = self.source, "Video player destroyed");
        }
        self.playback.lock().await.is_playing = false;
    }
}

/// One poll: read the position, and keep asking for the duration while it is unknown
async fn poll_tick(source: &'static str, handle: &HandleSlot, playback: &Mutex<PlaybackSnapshot>) {
    let Some(handle) = handle.lock().await.clone() else {
        return;
    };

    let current_time = handle.current_time();
    let mut playback = playback.lock().await;
    playback.current_time = current_time;

    if playback.duration <= 0.0 {
        let duration = handle.duration();
        if duration > 0.0 {
            playback.duration = duration;
            if playback.title.is_empty() {
                playback.title = handle.video_data().title;
            }
            tracing::debug!(source, duration, "Duration picked up by poll");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing::{flush, FakeVideoFactory};
    use crate::sdk::PlayerVars;

    async fn installed(factory: &FakeVideoFactory) -> VideoAdapter {
        let adapter = VideoAdapter::new("test", 40, Diagnostics::new());
        assert!(adapter.load_sdk(factory, &ScriptRegistry::new()).await);
        adapter
            .install(
                factory,
                VideoPlayerOptions {
                    video_id: "A".into(),
                    player_vars: PlayerVars::carousel(),
                },
            )
            .await
            .unwrap();
        adapter
    }

    #[tokio::test]
    async fn commands_without_handle_are_noops() {
        let diagnostics = Diagnostics::new();
        let adapter = VideoAdapter::new("test", 40, diagnostics.clone());

        adapter.toggle_play().await;
        adapter.toggle_mute().await;
        adapter.set_volume(0).await;
        adapter.on_ready().await;

        let snapshot = adapter.snapshot().await;
        assert!(!snapshot.is_playing);
        assert!(!snapshot.is_muted);
        assert_eq!(snapshot.volume, 40);
        assert!(diagnostics.history().is_empty());
    }

    #[tokio::test]
    async fn only_one_handle_is_created() {
        let factory = FakeVideoFactory::new();
        let adapter = installed(&factory).await;

        let second = adapter
            .install(
                &factory,
                VideoPlayerOptions {
                    video_id: "B".into(),
                    player_vars: PlayerVars::carousel(),
                },
            )
            .await;
        assert!(second.is_none());
        assert_eq!(factory.created().len(), 1);
    }

    #[tokio::test]
    async fn ready_applies_initial_policy_and_plays() {
        let factory = FakeVideoFactory::new();
        factory.handle.set_metadata("A", "First", 120.0);
        let adapter = installed(&factory).await;

        adapter.on_ready().await;

        let snapshot = adapter.snapshot().await;
        assert_eq!(snapshot.title, "First");
        assert_eq!(snapshot.duration, 120.0);
        assert!(snapshot.is_muted);
        assert_eq!(snapshot.volume, 40);
        assert!(factory.handle.is_muted());
        assert_eq!(factory.handle.volume(), 40);
        assert_eq!(factory.handle.play_calls(), 1);
        assert_eq!(factory.handle.state(), Some(VideoState::Playing));
    }

    #[tokio::test]
    async fn zero_volume_forces_mute_and_unmute_keeps_it() {
        let factory = FakeVideoFactory::new();
        let adapter = installed(&factory).await;
        adapter.set_volume(70).await;
        assert!(!adapter.snapshot().await.is_muted);

        adapter.set_volume(0).await;
        assert!(adapter.snapshot().await.is_muted);
        assert!(factory.handle.is_muted());

        adapter.toggle_mute().await;
        let snapshot = adapter.snapshot().await;
        assert!(snapshot.is_muted);
        assert!(snapshot.is_silent());

        adapter.set_volume(30).await;
        assert!(!adapter.snapshot().await.is_muted);
        assert!(!factory.handle.is_muted());

        adapter.toggle_mute().await;
        assert!(adapter.snapshot().await.is_muted);
        adapter.toggle_mute().await;
        assert!(!adapter.snapshot().await.is_muted);
    }

    #[tokio::test]
    async fn volume_is_clamped() {
        let factory = FakeVideoFactory::new();
        let adapter = installed(&factory).await;
        adapter.set_volume(250).await;
        assert_eq!(adapter.snapshot().await.volume, 100);
        assert_eq!(factory.handle.volume(), 100);
    }

    #[tokio::test]
    async fn state_changes_map_to_is_playing() {
        let factory = FakeVideoFactory::new();
        let adapter = installed(&factory).await;

        adapter.on_state_change(VideoState::Playing).await;
        assert!(adapter.snapshot().await.is_playing);
        adapter.on_state_change(VideoState::Buffering).await;
        assert!(!adapter.snapshot().await.is_playing);

        for state in [VideoState::Unstarted, VideoState::Cued, VideoState::Paused] {
            adapter.on_state_change(VideoState::Playing).await;
            adapter.on_state_change(state).await;
            assert!(!adapter.snapshot().await.is_playing, "{state:?} still reads as playing");
        }
        adapter.on_state_change(VideoState::Paused).await;
        assert!(!adapter.snapshot().await.is_playing);
        adapter.on_state_change(VideoState::Playing).await;
        adapter.on_state_change(VideoState::Ended).await;
        assert!(!adapter.snapshot().await.is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_tracks_position_and_heals_duration() {
        let factory = FakeVideoFactory::new();
        let adapter = installed(&factory).await;
        adapter.start_polling().await;
        flush().await;

        factory.handle.set_current_time(12.0);
        tokio::time::advance(POLL_INTERVAL).await;
        flush().await;
        let snapshot = adapter.snapshot().await;
        assert_eq!(snapshot.current_time, 12.0);
        assert_eq!(snapshot.duration, 0.0);

        factory.handle.set_metadata("A", "Late", 95.0);
        tokio::time::advance(POLL_INTERVAL).await;
        flush().await;
        let snapshot = adapter.snapshot().await;
        assert_eq!(snapshot.duration, 95.0);
        assert_eq!(snapshot.title, "Late");
    }

    #[tokio::test(start_paused = true)]
    async fn detach_stops_poll_and_destroys_handle() {
        let factory = FakeVideoFactory::new();
        let adapter = installed(&factory).await;
        adapter.start_polling().await;
        flush().await;

        adapter.detach().await;
        assert!(factory.handle.is_destroyed());
        assert!(!adapter.has_handle().await);

        factory.handle.set_current_time(50.0);
        tokio::time::advance(POLL_INTERVAL * 3).await;
        flush().await;
        assert_eq!(adapter.snapshot().await.current_time, 0.0);
    }
}
