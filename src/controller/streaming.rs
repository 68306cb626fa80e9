//! Streaming-audio adapter
//!
//! Connects a device through the streaming SDK and mirrors its events into a
//! [`StreamingPlayerState`] published on a `watch` channel. Commands go to the
//! connected transport; before the connection exists they do nothing.
//!
//! Every mount attempt carries a generation number. A connection that
//! completes after its generation was superseded is disconnected instead of
//! stored, and its events are never applied.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::error::{Diagnostics, PlayerError};
use crate::model::StreamingPlayerState;
use crate::sdk::{ScriptRegistry, SdkEvent, StreamingOptions, StreamingSdk, StreamingTransport, TokenProvider};

const SOURCE: &str = "streaming";

/// The connected device and the task mirroring its events
struct Live {
    transport: Arc<dyn StreamingTransport>,
    listener: JoinHandle<()>,
}

#[derive(Clone)]
pub struct StreamingAdapter {
    sdk: Arc<dyn StreamingSdk>,
    registry: ScriptRegistry,
    diagnostics: Diagnostics,
    name: String,
    volume: Arc<StdMutex<f32>>,
    token: Arc<StdMutex<String>>,
    state: Arc<watch::Sender<StreamingPlayerState>>,
    generation: Arc<AtomicU64>,
    live: Arc<Mutex<Option<Live>>>,
}

impl StreamingAdapter {
    pub async fn mount(
        sdk: Arc<dyn StreamingSdk>,
        registry: ScriptRegistry,
        name: &str,
        token: &str,
        volume: f32,
        diagnostics: Diagnostics,
    ) -> Self {
        let (state, _) = watch::channel(StreamingPlayerState::default());
        let adapter = Self {
            sdk,
            registry,
            diagnostics,
            name: name.to_string(),
            volume: Arc::new(StdMutex::new(clamp_volume(volume))),
            token: Arc::new(StdMutex::new(token.to_string())),
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            live: Arc::new(Mutex::new(None)),
        };
        adapter.start();
        adapter
    }

    fn start(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(name = %self.name, generation, "Mounting streaming player");
        tokio::spawn(self.clone().connect(generation));
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn token_provider(&self) -> TokenProvider {
        let token = self.token.clone();
        Arc::new(move || token.lock().map(|t| t.clone()).unwrap_or_default())
    }

    async fn connect(self, generation: u64) {
        let load = self
            .registry
            .ensure_loaded(self.sdk.script_url(), || self.sdk.load_script());
        if let Err(e) = load.await {
            self.diagnostics
                .report(SOURCE, PlayerError::Initialization(e.to_string()));
            return;
        }

        let options = StreamingOptions {
            name: self.name.clone(),
            get_oauth_token: self.token_provider(),
            volume: self.volume(),
        };
        let connection = match self.sdk.connect(options).await {
            Ok(connection) => connection,
            Err(e) => {
                self.diagnostics.report(SOURCE, e);
                return;
            }
        };

        // Checked under the lock, disconnect() bumps the generation before taking it
        let mut live = self.live.lock().await;
        if !self.is_current(generation) {
            drop(live);
            tracing::debug!(name = %self.name, generation, "Dropping connection from a superseded mount");
            connection.transport.disconnect().await;
            return;
        }

        let listener = tokio::spawn(self.clone().listen(generation, connection.events));
        *live = Some(Live {
            transport: connection.transport,
            listener,
        });
        tracing::info!(name = %self.name, generation, "Streaming player connected");
    }

    async fn listen(self, generation: u64, mut events: mpsc::UnboundedReceiver<SdkEvent>) {
        while let Some(event) = events.recv().await {
            if !self.is_current(generation) {
                break;
            }
            if let Some(error) = event.as_error() {
                self.diagnostics.report(SOURCE, error);
                continue;
            }

            let changed = self.state.send_if_modified(|state| state.apply(&event));
            tracing::trace!(?event, changed, "Streaming event applied");
        }
        tracing::debug!("Streaming event stream closed");
    }

    /// Receiver woken on every state change
    pub fn subscribe(&self) -> watch::Receiver<StreamingPlayerState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> StreamingPlayerState {
        self.state.borrow().clone()
    }

    /// Last volume handed to the device
    pub fn volume(&self) -> f32 {
        self.volume.lock().map(|v| *v).unwrap_or_default()
    }

    async fn connected(&self) -> Option<Arc<dyn StreamingTransport>> {
        let transport = self
            .live
            .lock()
            .await
            .as_ref()
            .map(|live| live.transport.clone());
        if transport.is_none() {
            self.diagnostics
                .report(SOURCE, PlayerError::SdkNotReady("streaming player"));
        }
        transport
    }

    fn check(&self, command: &'static str, result: Result<(), PlayerError>) {
        match result {
            Ok(()) => tracing::debug!(command, "Streaming command sent"),
            Err(e) => self.diagnostics.report(SOURCE, e),
        }
    }

    pub async fn toggle_play(&self) {
        if let Some(transport) = self.connected().await {
            self.check("toggle_play", transport.toggle_play().await);
        }
    }

    pub async fn skip_to_next(&self) {
        if let Some(transport) = self.connected().await {
            self.check("next_track", transport.next_track().await);
        }
    }

    pub async fn skip_to_previous(&self) {
        if let Some(transport) = self.connected().await {
            self.check("previous_track", transport.previous_track().await);
        }
    }

    pub async fn seek(&self, position_ms: u32) {
        if let Some(transport) = self.connected().await {
            self.check("seek", transport.seek(position_ms).await);
        }
    }

    /// 0.0 - 1.0, clamped
    pub async fn set_volume(&self, volume: f32) {
        let Some(transport) = self.connected().await else {
            return;
        };

        let volume = clamp_volume(volume);
        let result = transport.set_volume(volume).await;
        if result.is_ok() {
            if let Ok(mut current) = self.volume.lock() {
                *current = volume;
            }
        }
        self.check("set_volume", result);
    }

    /// Replace the token and reconnect with fresh state
    pub async fn set_token(&self, token: &str) {
        tracing::info!("Streaming token changed, reconnecting");
        self.disconnect().await;
        if let Ok(mut current) = self.token.lock() {
            *current = token.to_string();
        }
        self.state.send_replace(StreamingPlayerState::default());
        self.start();
    }

    async fn disconnect(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let live = self.live.lock().await.take();
        if let Some(Live { transport, listener }) = live {
            listener.abort();
            transport.disconnect().await;
            tracing::info!(name = %self.name, "Streaming player disconnected");
        }
    }

    pub async fn unmount(&self) {
        self.disconnect().await;
        self.state.send_modify(|state| state.is_ready = false);
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return 0.0;
    }
    volume.clamp(0.0, 1.0)
}
