//! File-based logging module for landing-player
//!
//! The terminal belongs to the TUI, so tracing output goes to a rolling file
//! instead of stdout.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_DIR: &str = ".logs";
const LOG_FILE_PREFIX: &str = "landing-player";
const DEFAULT_FILTER: &str = "landing_player=debug,librespot=info,rspotify=info,warn";

/// Initialize the logging system.
///
/// Logs are written to `.logs/landing-player.YYYY-MM-DD.log` with daily rotation.
/// `RUST_LOG` overrides the default filter.
pub fn init_logging() -> anyhow::Result<()> {
    let log_dir = Path::new(LOG_DIR);
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir)?;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The writer flushes on guard drop; it has to live until the process exits
    Box::leak(Box::new(guard));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Logging initialized - logs written to {}/", LOG_DIR);

    Ok(())
}

/// Log the outcome of an SDK command
#[macro_export]
macro_rules! log_sdk_result {
    ($operation:expr, $result:expr) => {
        match &$result {
            Ok(_) => tracing::debug!(operation = $operation, "SDK command issued"),
            Err(e) => tracing::warn!(operation = $operation, error = %e, "SDK command failed"),
        }
    };
}
