//! Test doubles for the SDK boundary

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::PlayerError;
use crate::sdk::{
    ContextPlayer, SdkEvent, StreamingConnection, StreamingOptions, StreamingSdk,
    StreamingTransport, VideoData, VideoEvent, VideoHandle, VideoPlayer, VideoPlayerFactory,
    VideoPlayerOptions, VideoState,
};

/// Let spawned tasks run until they block
pub async fn flush() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

#[derive(Default)]
struct FakeVideoState {
    current_id: String,
    previous_id: String,
    loaded_at: Option<Instant>,
    loaded: Vec<String>,
    metadata: HashMap<String, (String, f64)>,
    current_time: f64,
    muted: bool,
    volume: u8,
    state: Option<VideoState>,
    play_calls: usize,
    pause_calls: usize,
    destroyed: bool,
}

/// Video handle whose metadata can lag behind a load, like the real widget
#[derive(Default)]
pub struct FakeVideoHandle {
    state: Mutex<FakeVideoState>,
    metadata_lag: Mutex<Duration>,
}

impl FakeVideoHandle {
    fn with<R>(&self, f: impl FnOnce(&mut FakeVideoState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn set_metadata(&self, video_id: &str, title: &str, duration: f64) {
        self.with(|s| {
            s.metadata
                .insert(video_id.to_string(), (title.to_string(), duration))
        });
    }

    /// Until `lag` has passed after a load the handle keeps reporting the previous video's metadata
    pub fn set_metadata_lag(&self, lag: Duration) {
        *self.metadata_lag.lock().unwrap() = lag;
    }

    pub fn set_current_time(&self, seconds: f64) {
        self.with(|s| s.current_time = seconds);
    }

    pub fn loaded(&self) -> Vec<String> {
        self.with(|s| s.loaded.clone())
    }

    pub fn current_id(&self) -> String {
        self.with(|s| s.current_id.clone())
    }

    pub fn play_calls(&self) -> usize {
        self.with(|s| s.play_calls)
    }

    pub fn pause_calls(&self) -> usize {
        self.with(|s| s.pause_calls)
    }

    pub fn is_destroyed(&self) -> bool {
        self.with(|s| s.destroyed)
    }

    pub fn is_muted(&self) -> bool {
        self.with(|s| s.muted)
    }

    pub fn volume(&self) -> u8 {
        self.with(|s| s.volume)
    }

    pub fn state(&self) -> Option<VideoState> {
        self.with(|s| s.state)
    }

    fn metadata_id(&self) -> String {
        let lag = *self.metadata_lag.lock().unwrap();
        self.with(|s| match s.loaded_at {
            Some(at) if at.elapsed() < lag => s.previous_id.clone(),
            _ => s.current_id.clone(),
        })
    }
}

impl VideoHandle for FakeVideoHandle {
    fn play_video(&self) {
        self.with(|s| {
            s.play_calls += 1;
            s.state = Some(VideoState::Playing);
        });
    }

    fn pause_video(&self) {
        self.with(|s| {
            s.pause_calls += 1;
            s.state = Some(VideoState::Paused);
        });
    }

    fn mute(&self) {
        self.with(|s| s.muted = true);
    }

    fn unmute(&self) {
        self.with(|s| s.muted = false);
    }

    fn set_volume(&self, volume: u8) {
        self.with(|s| s.volume = volume);
    }

    fn current_time(&self) -> f64 {
        self.with(|s| s.current_time)
    }

    fn duration(&self) -> f64 {
        let id = self.metadata_id();
        self.with(|s| s.metadata.get(&id).map(|(_, d)| *d).unwrap_or(0.0))
    }

    fn video_data(&self) -> VideoData {
        let id = self.metadata_id();
        self.with(|s| VideoData {
            video_id: s.current_id.clone(),
            title: s.metadata.get(&id).map(|(t, _)| t.clone()).unwrap_or_default(),
        })
    }

    fn load_video_by_id(&self, video_id: &str) {
        self.with(|s| {
            s.previous_id = std::mem::replace(&mut s.current_id, video_id.to_string());
            s.loaded_at = Some(Instant::now());
            s.loaded.push(video_id.to_string());
            s.current_time = 0.0;
        });
    }

    fn destroy(&self) {
        self.with(|s| s.destroyed = true);
    }
}

pub struct FakeVideoFactory {
    pub handle: Arc<FakeVideoHandle>,
    created: Mutex<Vec<VideoPlayerOptions>>,
    events: Mutex<Option<mpsc::UnboundedSender<VideoEvent>>>,
    script_error: Option<String>,
}

impl FakeVideoFactory {
    pub fn new() -> Self {
        Self {
            handle: Arc::new(FakeVideoHandle::default()),
            created: Mutex::new(Vec::new()),
            events: Mutex::new(None),
            script_error: None,
        }
    }

    pub fn with_script_error(message: &str) -> Self {
        Self {
            script_error: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn created(&self) -> Vec<VideoPlayerOptions> {
        self.created.lock().unwrap().clone()
    }

    pub fn send(&self, event: VideoEvent) {
        let events = self.events.lock().unwrap();
        events
            .as_ref()
            .expect("player not created yet")
            .send(event)
            .expect("adapter stopped listening");
    }
}

impl VideoPlayerFactory for FakeVideoFactory {
    fn script_url(&self) -> &str {
        "fake://video"
    }

    fn load_script(&self) -> BoxFuture<'static, Result<(), String>> {
        let result = match &self.script_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        };
        async move { result }.boxed()
    }

    fn create(&self, options: VideoPlayerOptions) -> Result<VideoPlayer, PlayerError> {
        self.handle.with(|s| s.current_id = options.video_id.clone());
        self.created.lock().unwrap().push(options);

        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.lock().unwrap() = Some(tx);
        Ok(VideoPlayer {
            handle: self.handle.clone(),
            events: rx,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TransportCall {
    TogglePlay,
    Next,
    Previous,
    Seek(u32),
    Volume(f32),
    Disconnect,
}

#[derive(Default)]
pub struct FakeTransport {
    calls: Mutex<Vec<TransportCall>>,
    fail_with: Mutex<Option<PlayerError>>,
}

impl FakeTransport {
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_with(&self, error: PlayerError) {
        *self.fail_with.lock().unwrap() = Some(error);
    }

    fn record(&self, call: TransportCall) -> Result<(), PlayerError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_with.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StreamingTransport for FakeTransport {
    async fn toggle_play(&self) -> Result<(), PlayerError> {
        self.record(TransportCall::TogglePlay)
    }

    async fn next_track(&self) -> Result<(), PlayerError> {
        self.record(TransportCall::Next)
    }

    async fn previous_track(&self) -> Result<(), PlayerError> {
        self.record(TransportCall::Previous)
    }

    async fn seek(&self, position_ms: u32) -> Result<(), PlayerError> {
        self.record(TransportCall::Seek(position_ms))
    }

    async fn set_volume(&self, volume: f32) -> Result<(), PlayerError> {
        self.record(TransportCall::Volume(volume))
    }

    async fn disconnect(&self) {
        let _ = self.record(TransportCall::Disconnect);
    }
}

/// Streaming SDK that hands out scripted connections
#[derive(Default)]
pub struct FakeStreamingSdk {
    connections: Mutex<Vec<(Arc<FakeTransport>, mpsc::UnboundedSender<SdkEvent>)>>,
    tokens: Mutex<Vec<String>>,
    connect_error: Mutex<Option<PlayerError>>,
    loads: AtomicUsize,
}

impl FakeStreamingSdk {
    pub fn fail_connect(&self, error: PlayerError) {
        *self.connect_error.lock().unwrap() = Some(error);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    pub fn transport(&self, index: usize) -> Arc<FakeTransport> {
        self.connections.lock().unwrap()[index].0.clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    pub fn script_loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Emit on the most recent connection
    pub fn send(&self, event: SdkEvent) {
        let connections = self.connections.lock().unwrap();
        let (_, events) = connections.last().expect("not connected");
        let _ = events.send(event);
    }
}

#[async_trait]
impl StreamingSdk for FakeStreamingSdk {
    fn script_url(&self) -> &str {
        "fake://streaming"
    }

    fn load_script(&self) -> BoxFuture<'static, Result<(), String>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }.boxed()
    }

    async fn connect(&self, options: StreamingOptions) -> Result<StreamingConnection, PlayerError> {
        self.tokens.lock().unwrap().push((options.get_oauth_token)());
        if let Some(e) = self.connect_error.lock().unwrap().clone() {
            return Err(e);
        }

        let transport = Arc::new(FakeTransport::default());
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.lock().unwrap().push((transport.clone(), tx));
        Ok(StreamingConnection {
            transport,
            events: rx,
        })
    }
}

/// Records contextual-play requests
#[derive(Default)]
pub struct RecordingContextPlayer {
    calls: Mutex<Vec<(String, String)>>,
    fail_with: Mutex<Option<PlayerError>>,
}

impl RecordingContextPlayer {
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_with(&self, error: PlayerError) {
        *self.fail_with.lock().unwrap() = Some(error);
    }
}

#[async_trait]
impl ContextPlayer for RecordingContextPlayer {
    async fn play_context(&self, device_id: &str, context_uri: &str) -> Result<(), PlayerError> {
        self.calls
            .lock()
            .unwrap()
            .push((device_id.to_string(), context_uri.to_string()));
        match self.fail_with.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
