//! Headless video player
//!
//! A terminal has nowhere to draw an embedded video widget, so the host page
//! drives the carousel with a clock-backed stand-in. It keeps the same
//! contract as the real widget: it reports ready after a short boot, takes a
//! moment to publish metadata after each load, and emits `Ended` when the
//! clock runs past the duration.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::video::{
    VideoData, VideoEvent, VideoHandle, VideoPlayer, VideoPlayerFactory, VideoPlayerOptions,
    VideoState,
};
use crate::config::TrackEntry;
use crate::error::PlayerError;

pub const HEADLESS_SCRIPT_URL: &str = "headless://video-player";

const DEFAULT_DURATION_SECS: f64 = 210.0;
const BOOT_DELAY: Duration = Duration::from_millis(150);
const METADATA_DELAY: Duration = Duration::from_millis(300);
const CLOCK_TICK: Duration = Duration::from_millis(200);

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogEntry {
    pub title: String,
    pub duration_secs: f64,
}

#[derive(Clone, Default)]
pub struct HeadlessVideoSdk {
    catalog: Arc<HashMap<String, CatalogEntry>>,
}

impl HeadlessVideoSdk {
    pub fn new(tracks: &[TrackEntry]) -> Self {
        let catalog = tracks
            .iter()
            .map(|t| {
                let entry = CatalogEntry {
                    title: t.title.clone().unwrap_or_else(|| format!("Video {}", t.id)),
                    duration_secs: t.duration_secs.unwrap_or(DEFAULT_DURATION_SECS),
                };
                (t.id.clone(), entry)
            })
            .collect();

        Self {
            catalog: Arc::new(catalog),
        }
    }
}

fn lookup(catalog: &HashMap<String, CatalogEntry>, video_id: &str) -> CatalogEntry {
    catalog.get(video_id).cloned().unwrap_or_else(|| CatalogEntry {
        title: format!("Video {}", video_id),
        duration_secs: DEFAULT_DURATION_SECS,
    })
}

impl VideoPlayerFactory for HeadlessVideoSdk {
    fn script_url(&self) -> &str {
        HEADLESS_SCRIPT_URL
    }

    fn load_script(&self) -> BoxFuture<'static, Result<(), String>> {
        async { Ok(()) }.boxed()
    }

    fn create(&self, options: VideoPlayerOptions) -> Result<VideoPlayer, PlayerError> {
        if options.video_id.is_empty() {
            return Err(PlayerError::Initialization("video id is empty".into()));
        }

        if let Ok(vars) = serde_json::to_string(&options.player_vars) {
            tracing::debug!(video_id = %options.video_id, player_vars = %vars, "Creating headless video player");
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let now = Instant::now();
        let shared = Arc::new(Shared {
            clock: Mutex::new(Clock {
                entry: lookup(&self.catalog, &options.video_id),
                video_id: options.video_id,
                loaded_at: now,
                offset: 0.0,
                started_at: None,
                state: VideoState::Unstarted,
                destroyed: false,
            }),
            events: events_tx,
            catalog: self.catalog.clone(),
        });

        tokio::spawn(run_clock(Arc::downgrade(&shared)));

        Ok(VideoPlayer {
            handle: Arc::new(HeadlessVideo { shared }),
            events: events_rx,
        })
    }
}

struct Clock {
    video_id: String,
    entry: CatalogEntry,
    loaded_at: Instant,
    offset: f64,
    started_at: Option<Instant>,
    state: VideoState,
    destroyed: bool,
}

impl Clock {
    fn position(&self, now: Instant) -> f64 {
        let running = self
            .started_at
            .map(|s| now.duration_since(s).as_secs_f64())
            .unwrap_or(0.0);
        (self.offset + running).min(self.entry.duration_secs)
    }

    fn metadata_ready(&self, now: Instant) -> bool {
        now.duration_since(self.loaded_at) >= METADATA_DELAY
    }
}

struct Shared {
    clock: Mutex<Clock>,
    events: mpsc::UnboundedSender<VideoEvent>,
    catalog: Arc<HashMap<String, CatalogEntry>>,
}

impl Shared {
    fn clock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: VideoEvent) {
        // Receiver gone means the adapter unmounted
        let _ = self.events.send(event);
    }
}

async fn run_clock(shared: Weak<Shared>) {
    tokio::time::sleep(BOOT_DELAY).await;
    match shared.upgrade() {
        Some(shared) => shared.emit(VideoEvent::Ready),
        None => return,
    }

    let mut interval = tokio::time::interval(CLOCK_TICK);
    loop {
        interval.tick().await;

        let Some(shared) = shared.upgrade() else {
            break;
        };
        if shared.events.is_closed() {
            break;
        }

        let mut clock = shared.clock();
        if clock.destroyed {
            break;
        }

        let now = Instant::now();
        if clock.state == VideoState::Playing && clock.position(now) >= clock.entry.duration_secs {
            clock.offset = clock.entry.duration_secs;
            clock.started_at = None;
            clock.state = VideoState::Ended;
            tracing::trace!(video_id = %clock.video_id, "Headless video ended");
            drop(clock);
            shared.emit(VideoEvent::StateChange(VideoState::Ended));
        }
    }
}

pub struct HeadlessVideo {
    shared: Arc<Shared>,
}

impl VideoHandle for HeadlessVideo {
    fn play_video(&self) {
        let mut clock = self.shared.clock();
        if clock.destroyed || clock.state == VideoState::Playing {
            return;
        }
        if clock.state == VideoState::Ended {
            clock.offset = 0.0;
        }
        clock.started_at = Some(Instant::now());
        clock.state = VideoState::Playing;
        drop(clock);
        self.shared.emit(VideoEvent::StateChange(VideoState::Playing));
    }

    fn pause_video(&self) {
        let mut clock = self.shared.clock();
        if clock.destroyed || clock.state != VideoState::Playing {
            return;
        }
        clock.offset = clock.position(Instant::now());
        clock.started_at = None;
        clock.state = VideoState::Paused;
        drop(clock);
        self.shared.emit(VideoEvent::StateChange(VideoState::Paused));
    }

    // No audio output here
    fn mute(&self) {
        tracing::trace!(video_id = %self.shared.clock().video_id, "Headless video muted");
    }

    fn unmute(&self) {
        tracing::trace!(video_id = %self.shared.clock().video_id, "Headless video unmuted");
    }

    fn set_volume(&self, volume: u8) {
        tracing::trace!(video_id = %self.shared.clock().video_id, volume, "Headless video volume");
    }

    fn current_time(&self) -> f64 {
        self.shared.clock().position(Instant::now())
    }

    fn duration(&self) -> f64 {
        let clock = self.shared.clock();
        if clock.metadata_ready(Instant::now()) {
            clock.entry.duration_secs
        } else {
            0.0
        }
    }

    fn video_data(&self) -> VideoData {
        let clock = self.shared.clock();
        let title = if clock.metadata_ready(Instant::now()) {
            clock.entry.title.clone()
        } else {
            String::new()
        };
        VideoData {
            video_id: clock.video_id.clone(),
            title,
        }
    }

    fn load_video_by_id(&self, video_id: &str) {
        let mut clock = self.shared.clock();
        if clock.destroyed {
            return;
        }
        let now = Instant::now();
        clock.video_id = video_id.to_string();
        clock.entry = lookup(&self.shared.catalog, video_id);
        clock.loaded_at = now;
        clock.offset = 0.0;
        clock.started_at = Some(now);
        clock.state = VideoState::Playing;
        drop(clock);
        self.shared.emit(VideoEvent::StateChange(VideoState::Playing));
    }

    fn destroy(&self) {
        let mut clock = self.shared.clock();
        clock.destroyed = true;
        clock.started_at = None;
        clock.state = VideoState::Unstarted;
    }
}
