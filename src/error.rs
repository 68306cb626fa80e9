//! Error taxonomy and the non-fatal diagnostic channel
//!
//! Adapter commands never return errors to their callers. Anything that goes
//! wrong at runtime is handed to [`Diagnostics`], which logs it and keeps the
//! latest message around so the view can show it for a few seconds.

#[cfg(test)]
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;

/// How long a diagnostic stays visible before it is auto-cleared
pub const DIAGNOSTIC_TTL: Duration = Duration::from_secs(5);

/// Reported errors kept for test assertions
#[cfg(test)]
const HISTORY_LIMIT: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("{0} is not ready yet")]
    SdkNotReady(&'static str),

    #[error("Playback failed: {0}")]
    NetworkOrPlayback(String),

    #[error("Player initialization failed: {0}")]
    Initialization(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Account error: {0}")]
    Account(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl PlayerError {
    /// Short machine-friendly name, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            PlayerError::SdkNotReady(_) => "sdk_not_ready",
            PlayerError::NetworkOrPlayback(_) => "playback_error",
            PlayerError::Initialization(_) => "initialization_error",
            PlayerError::Authentication(_) => "authentication_error",
            PlayerError::Account(_) => "account_error",
            PlayerError::Configuration(_) => "configuration_error",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub source: &'static str,
    pub error: PlayerError,
    pub at: Instant,
}

/// Shared sink for runtime errors. Cheap to clone.
#[derive(Clone, Default)]
pub struct Diagnostics {
    latest: Arc<Mutex<Option<Diagnostic>>>,
    #[cfg(test)]
    reported: Arc<Mutex<VecDeque<PlayerError>>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, source: &'static str, error: PlayerError) {
        if let PlayerError::SdkNotReady(_) = error {
            // Readiness lags mount, this is expected and not worth surfacing
            tracing::trace!(source, error = %error, "Command ignored");
            return;
        }

        tracing::error!(source, kind = error.kind(), error = %error, "Player error reported");

        #[cfg(test)]
        if let Ok(mut reported) = self.reported.lock() {
            if reported.len() == HISTORY_LIMIT {
                reported.pop_front();
            }
            reported.push_back(error.clone());
        }
        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(Diagnostic {
                source,
                error,
                at: Instant::now(),
            });
        }
    }

    /// Latest diagnostic still within its display window
    pub fn current(&self) -> Option<Diagnostic> {
        let mut latest = self.latest.lock().ok()?;
        if latest
            .as_ref()
            .is_some_and(|d| d.at.elapsed() >= DIAGNOSTIC_TTL)
        {
            *latest = None;
        }
        latest.clone()
    }

    pub fn clear(&self) {
        if let Ok(mut latest) = self.latest.lock() {
            *latest = None;
        }
    }

    /// Most recent reported errors, oldest first
    #[cfg(test)]
    pub fn history(&self) -> Vec<PlayerError> {
        self.reported
            .lock()
            .map(|r| r.iter().cloned().collect())
            .unwrap_or_default()
    }
}
