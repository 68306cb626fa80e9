mod config;
mod controller;
mod error;
mod logging;
mod model;
mod sdk;
mod view;

use std::io;
use std::sync::Arc;
use anyhow::Result;
use std::time::Duration;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use config::{Config, VideoMode};
use controller::{AppController, AutoStart, CarouselController, SingleTrackAdapter, StreamingAdapter, VideoSurface};
use error::{Diagnostics, PlayerError};
use sdk::{HeadlessVideoSdk, LibrespotSdk, ScriptRegistry, VideoPlayerFactory, WebApiClient};
use view::AppView;

/// How long the render loop waits for input before redrawing
const INPUT_POLL: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== Landing Player Starting ===");

    let config = Config::from_env()?;
    tracing::info!(
        mode = ?config.mode,
        tracks = config.tracks.len(),
        streaming = config.streaming.is_some(),
        "Configuration loaded"
    );

    let diagnostics = Diagnostics::new();
    let registry = ScriptRegistry::global().clone();

    // Step 1: Video surface
    let video_sdk: Arc<dyn VideoPlayerFactory> = Arc::new(HeadlessVideoSdk::new(&config.tracks));
    let video = match config.mode {
        VideoMode::Carousel => VideoSurface::Carousel(
            CarouselController::mount(
                config.track_ids(),
                video_sdk,
                registry.clone(),
                config.volume,
                diagnostics.clone(),
            )
            .await?,
        ),
        VideoMode::Single => {
            let track = config
                .tracks
                .first()
                .ok_or_else(|| PlayerError::Configuration("no track to play".into()))?;
            VideoSurface::Single(
                SingleTrackAdapter::mount(&track.id, video_sdk, registry.clone(), config.volume, diagnostics.clone())
                    .await,
            )
        }
    };

    // Step 2: Streaming player, only with a token
    let streaming = match &config.streaming {
        Some(streaming) => Some(
            StreamingAdapter::mount(
                Arc::new(LibrespotSdk::new()),
                registry.clone(),
                &streaming.device_name,
                &streaming.access_token,
                streaming.volume,
                diagnostics.clone(),
            )
            .await,
        ),
        None => None,
    };

    let controller = AppController::new(video, streaming, diagnostics.clone());

    // Step 3: Auto-start the configured context once the device is ready
    if let Some(streaming) = &config.streaming {
        if let Some(context_uri) = &streaming.context_uri {
            match WebApiClient::with_token(&streaming.access_token).await {
                Ok(client) => {
                    let autostart = AutoStart::new(context_uri, Arc::new(client), diagnostics.clone());
                    controller.enable_autostart(autostart).await;
                }
                Err(e) => diagnostics.report("autostart", e),
            }
        }
    }

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, controller.clone()).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    controller.shutdown().await;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("Landing Player shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: AppController,
) -> io::Result<()> {
    loop {
        // Diagnostics older than their display window are dropped here
        let page = controller.page_snapshot().await;

        terminal.draw(|f| {
            AppView::render(f, &page);
        })?;

        if event::poll(INPUT_POLL)? {
            let result = match event::read()? {
                Event::Key(key) => controller.handle_key_event(key).await,
                Event::Mouse(mouse) => controller.handle_mouse_event(mouse).await,
                _ => Ok(()),
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, "Input handling failed");
            }
        }

        if controller.should_quit().await {
            break;
        }
    }

    Ok(())
}
