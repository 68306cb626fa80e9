//! Web API calls that sit next to the streaming SDK
//!
//! Contextual playback is started over REST
//! (`PUT /me/player/play?device_id=<id>` with `{context_uri}`), not through
//! the connected device itself.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rspotify::{
    http::HttpError,
    model::{AlbumId, ArtistId, PlayContextId, PlaylistId},
    prelude::*,
    AuthCodeSpotify, ClientError, Config, Token,
};

use crate::error::PlayerError;

const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Starts playback of a context on a given device
#[async_trait]
pub trait ContextPlayer: Send + Sync {
    async fn play_context(&self, device_id: &str, context_uri: &str) -> Result<(), PlayerError>;
}

#[derive(Clone)]
pub struct WebApiClient {
    client: Arc<AuthCodeSpotify>,
}

impl WebApiClient {
    /// Build a client around an externally supplied bearer token
    pub async fn with_token(access_token: &str) -> Result<Self, PlayerError> {
        let spotify = AuthCodeSpotify::with_config(
            Default::default(),
            Default::default(),
            Config {
                token_cached: false,
                token_refreshing: false,
                ..Default::default()
            },
        );

        let token = Token {
            access_token: access_token.to_string(),
            expires_in: chrono::Duration::seconds(TOKEN_LIFETIME_SECS),
            expires_at: Some(Utc::now() + chrono::Duration::seconds(TOKEN_LIFETIME_SECS)),
            scopes: HashSet::new(),
            refresh_token: None,
        };

        *spotify
            .token
            .lock()
            .await
            .map_err(|_| PlayerError::Initialization("token store is poisoned".into()))? = Some(token);
        tracing::debug!("Web API client initialized");

        Ok(Self {
            client: Arc::new(spotify),
        })
    }
}

/// Parse a `spotify:<kind>:<id>` context URI
pub fn parse_context_uri(context_uri: &str) -> Result<PlayContextId<'_>, PlayerError> {
    let invalid = || PlayerError::Configuration(format!("unsupported context uri: {}", context_uri));

    let mut parts = context_uri.split(':');
    let (Some("spotify"), Some(kind), Some(id), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let context = match kind {
        "playlist" => PlayContextId::Playlist(PlaylistId::from_id(id).map_err(|_| invalid())?),
        "album" => PlayContextId::Album(AlbumId::from_id(id).map_err(|_| invalid())?),
        "artist" => PlayContextId::Artist(ArtistId::from_id(id).map_err(|_| invalid())?),
        _ => return Err(invalid()),
    };
    Ok(context)
}

/// Map a Web API failure onto the error taxonomy by its HTTP status
pub fn classify_api_error(error: &ClientError) -> PlayerError {
    let status = match error {
        ClientError::Http(http) => match http.as_ref() {
            HttpError::StatusCode(response) => Some(response.status().as_u16()),
            _ => None,
        },
        _ => None,
    };
    classify_status(status, error.to_string())
}

fn classify_status(status: Option<u16>, message: String) -> PlayerError {
    match status {
        Some(401) => PlayerError::Authentication(message),
        Some(403) => PlayerError::Account(message),
        _ => PlayerError::NetworkOrPlayback(message),
    }
}

#[async_trait]
impl ContextPlayer for WebApiClient {
    async fn play_context(&self, device_id: &str, context_uri: &str) -> Result<(), PlayerError> {
        let context = parse_context_uri(context_uri)?;
        tracing::debug!(device_id, context_uri, "API: start_context_playback");

        let result = self
            .client
            .start_context_playback(context, Some(device_id), None, None)
            .await;
        crate::log_sdk_result!("start_context_playback", result);

        result.map_err(|e| classify_api_error(&e))
    }
}
