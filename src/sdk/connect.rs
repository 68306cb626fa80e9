//! Streaming SDK backed by librespot (Spotify Connect)
//!
//! Registers a Spotify Connect device with the externally supplied token and
//! translates librespot player events into [`SdkEvent`]s.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use librespot::connect::{ConnectConfig, Spirc};
use librespot::core::authentication::Credentials;
use librespot::core::config::SessionConfig;
use librespot::core::error::ErrorKind;
use librespot::core::session::Session;
use librespot::metadata::audio::UniqueFields;
use librespot::playback::config::{AudioFormat, Bitrate, PlayerConfig};
use librespot::playback::mixer::MixerConfig;
use librespot::playback::player::{Player, PlayerEvent, PlayerEventChannel};
use librespot::playback::{audio_backend, mixer};
use tokio::sync::mpsc;

use super::streaming::{
    SdkAlbum, SdkArtist, SdkEvent, SdkImage, SdkPlaybackState, SdkTrack, StreamingConnection,
    StreamingOptions, StreamingSdk, StreamingTransport,
};
use crate::error::PlayerError;

pub const LIBRESPOT_SCRIPT_URL: &str = "librespot://connect";

#[derive(Clone, Default)]
pub struct LibrespotSdk;

impl LibrespotSdk {
    pub fn new() -> Self {
        Self
    }

    fn device_id(name: &str) -> String {
        // Stable per machine so the account does not collect ghost devices
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        format!("{}-{}", name, hostname)
    }
}

fn classify(error: librespot::core::Error) -> PlayerError {
    match error.kind {
        ErrorKind::Unauthenticated => PlayerError::Authentication(error.to_string()),
        ErrorKind::PermissionDenied => PlayerError::Account(error.to_string()),
        _ => PlayerError::Initialization(error.to_string()),
    }
}

fn volume_to_u16(volume: f32) -> u16 {
    (volume.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16
}

#[async_trait]
impl StreamingSdk for LibrespotSdk {
    fn script_url(&self) -> &str {
        LIBRESPOT_SCRIPT_URL
    }

    fn load_script(&self) -> BoxFuture<'static, Result<(), String>> {
        async {
            audio_backend::find(None)
                .map(|_| ())
                .ok_or_else(|| "no audio backend available".to_string())
        }
        .boxed()
    }

    async fn connect(&self, options: StreamingOptions) -> Result<StreamingConnection, PlayerError> {
        let device_id = Self::device_id(&options.name);
        tracing::info!(device_name = %options.name, device_id = %device_id, "Connecting librespot device");

        let session_config = SessionConfig {
            device_id: device_id.clone(),
            ..Default::default()
        };
        let player_config = PlayerConfig {
            bitrate: Bitrate::Bitrate320,
            ..Default::default()
        };
        let connect_config = ConnectConfig {
            name: options.name.clone(),
            ..Default::default()
        };
        let audio_format = AudioFormat::default();

        let sink_builder = audio_backend::find(None)
            .ok_or_else(|| PlayerError::Initialization("no audio backend available".into()))?;
        let mixer_builder =
            mixer::find(None).ok_or_else(|| PlayerError::Initialization("no mixer available".into()))?;

        let session = Session::new(session_config, None);
        let mixer = mixer_builder(MixerConfig::default()).map_err(classify)?;

        let player = Player::new(
            player_config,
            session.clone(),
            mixer.get_soft_volume(),
            move || sink_builder(None, audio_format),
        );
        let player_events = player.get_player_event_channel();

        let credentials = Credentials::with_access_token((options.get_oauth_token)());
        let (spirc, spirc_task) = Spirc::new(
            connect_config,
            session.clone(),
            credentials,
            player.clone(),
            mixer,
        )
        .await
        .map_err(classify)?;

        tokio::spawn(async move {
            spirc_task.await;
            tracing::debug!("Spirc task finished");
        });

        if let Err(e) = spirc.set_volume(volume_to_u16(options.volume)) {
            tracing::warn!(error = %e, "Failed to apply initial volume");
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let _ = events_tx.send(SdkEvent::Ready {
            device_id: device_id.clone(),
        });
        tokio::spawn(forward_player_events(player_events, events_tx, device_id));

        tracing::info!(device_name = %options.name, "librespot device registered");

        Ok(StreamingConnection {
            transport: Arc::new(LibrespotTransport {
                spirc,
                player,
                session,
            }),
            events: events_rx,
        })
    }
}

fn track_from_audio_item(audio_item: &librespot::metadata::audio::AudioItem) -> SdkTrack {
    let (artists, album) = match &audio_item.unique_fields {
        UniqueFields::Track { artists, album, .. } => {
            let artists = artists
                .0
                .iter()
                .map(|a| SdkArtist {
                    name: a.name.clone(),
                    uri: String::new(),
                })
                .collect();
            (artists, album.clone())
        }
        UniqueFields::Episode { show_name, .. } => (
            vec![SdkArtist {
                name: show_name.clone(),
                uri: String::new(),
            }],
            "Podcast".to_string(),
        ),
        UniqueFields::Local { artists, album, .. } => (
            artists
                .iter()
                .map(|name| SdkArtist {
                    name: name.clone(),
                    uri: String::new(),
                })
                .collect(),
            album.clone().unwrap_or_default(),
        ),
    };

    let uri = audio_item.track_id.to_uri().unwrap_or_default();
    let id = uri.rsplit(':').next().filter(|s| !s.is_empty()).map(str::to_string);

    SdkTrack {
        id,
        uri,
        name: audio_item.name.clone(),
        artists,
        album: SdkAlbum {
            name: album,
            uri: String::new(),
            images: audio_item
                .covers
                .iter()
                .map(|c| SdkImage { url: c.url.clone() })
                .collect(),
        },
        duration_ms: audio_item.duration_ms,
    }
}

/// Keeps a running playback state and publishes it after every relevant player event
async fn forward_player_events(
    mut player_events: PlayerEventChannel,
    events: mpsc::UnboundedSender<SdkEvent>,
    device_id: String,
) {
    let mut state = SdkPlaybackState {
        paused: true,
        ..Default::default()
    };

    while let Some(event) = player_events.recv().await {
        let publish = match event {
            PlayerEvent::Playing { position_ms, .. } => {
                tracing::trace!(position_ms, "PlayerEvent::Playing");
                state.paused = false;
                state.position = position_ms;
                true
            }
            PlayerEvent::Paused { position_ms, .. } => {
                tracing::debug!(position_ms, "PlayerEvent::Paused");
                state.paused = true;
                state.position = position_ms;
                true
            }
            PlayerEvent::Seeked { position_ms, .. } | PlayerEvent::PositionChanged { position_ms, .. } => {
                state.position = position_ms;
                true
            }
            PlayerEvent::TrackChanged { audio_item } => {
                let track = track_from_audio_item(&audio_item);
                tracing::info!(track = %track.name, uri = %track.uri, "PlayerEvent::TrackChanged");
                state.duration = track.duration_ms;
                state.position = 0;
                state.track_window.current_track = Some(track);
                true
            }
            PlayerEvent::Stopped { .. } => {
                tracing::debug!("PlayerEvent::Stopped");
                state.paused = true;
                state.position = 0;
                true
            }
            PlayerEvent::Unavailable { .. } => {
                tracing::warn!("PlayerEvent::Unavailable");
                let _ = events.send(SdkEvent::PlaybackError("track is unavailable".into()));
                false
            }
            PlayerEvent::SessionDisconnected { .. } => {
                tracing::info!("PlayerEvent::SessionDisconnected");
                let _ = events.send(SdkEvent::NotReady {
                    device_id: device_id.clone(),
                });
                false
            }
            _ => false,
        };

        if publish && events.send(SdkEvent::PlayerStateChanged(Some(state.clone()))).is_err() {
            break;
        }
    }

    tracing::debug!("librespot event forwarder stopped");
}

struct LibrespotTransport {
    spirc: Spirc,
    player: Arc<Player>,
    session: Session,
}

fn playback_error(e: librespot::core::Error) -> PlayerError {
    PlayerError::NetworkOrPlayback(e.to_string())
}

#[async_trait]
impl StreamingTransport for LibrespotTransport {
    async fn toggle_play(&self) -> Result<(), PlayerError> {
        self.spirc.play_pause().map_err(playback_error)
    }

    async fn next_track(&self) -> Result<(), PlayerError> {
        self.spirc.next().map_err(playback_error)
    }

    async fn previous_track(&self) -> Result<(), PlayerError> {
        self.spirc.prev().map_err(playback_error)
    }

    async fn seek(&self, position_ms: u32) -> Result<(), PlayerError> {
        self.player.seek(position_ms);
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> Result<(), PlayerError> {
        self.spirc.set_volume(volume_to_u16(volume)).map_err(playback_error)
    }

    async fn disconnect(&self) {
        if let Err(e) = self.spirc.shutdown() {
            tracing::warn!(error = %e, "Spirc shutdown failed");
        }
        self.session.shutdown();
        tracing::info!("librespot device disconnected");
    }
}
