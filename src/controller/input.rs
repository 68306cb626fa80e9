//! Key and mouse handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};

use super::AppController;

/// Drag units per terminal column
pub const DRAG_UNITS_PER_COLUMN: f64 = 8.0;

const VOLUME_STEP: u8 = 10;
const STREAM_VOLUME_STEP: f32 = 0.1;
const SEEK_STEP_MS: u32 = 10_000;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.quit().await,
            KeyCode::Esc => self.diagnostics.clear(),

            // Video
            KeyCode::Char(' ') => self.video.toggle_play().await,
            KeyCode::Char('m') | KeyCode::Char('M') => self.video.toggle_mute().await,
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let volume = self.video.snapshot().await.playback.volume;
                self.video.set_volume(volume.saturating_add(VOLUME_STEP)).await;
            }
            KeyCode::Char('-') => {
                let volume = self.video.snapshot().await.playback.volume;
                self.video.set_volume(volume.saturating_sub(VOLUME_STEP)).await;
            }
            KeyCode::Left => {
                if let Some(carousel) = self.video.carousel() {
                    carousel.previous().await;
                }
            }
            KeyCode::Right => {
                if let Some(carousel) = self.video.carousel() {
                    carousel.next().await;
                }
            }
            KeyCode::Char(c @ '1'..='9') => {
                if let Some(carousel) = self.video.carousel() {
                    let index = c as usize - '1' as usize;
                    carousel.select(index).await;
                }
            }
            KeyCode::Char('t') | KeyCode::Char('T') => {
                if !self.video.thumbnail_failed().await {
                    tracing::debug!("No thumbnail fallback left");
                }
            }

            // Streaming
            KeyCode::Char('s') | KeyCode::Char('S') => {
                if let Some(streaming) = &self.streaming {
                    streaming.toggle_play().await;
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                if let Some(streaming) = &self.streaming {
                    streaming.skip_to_next().await;
                }
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                if let Some(streaming) = &self.streaming {
                    streaming.skip_to_previous().await;
                }
            }
            KeyCode::Char(']') => {
                if let Some(streaming) = &self.streaming {
                    let state = streaming.snapshot();
                    let position = state.position.saturating_add(SEEK_STEP_MS);
                    let position = if state.duration > 0 { position.min(state.duration) } else { position };
                    streaming.seek(position).await;
                }
            }
            KeyCode::Char('[') => {
                if let Some(streaming) = &self.streaming {
                    let position = streaming.snapshot().position.saturating_sub(SEEK_STEP_MS);
                    streaming.seek(position).await;
                }
            }
            KeyCode::Char('.') => {
                if let Some(streaming) = &self.streaming {
                    streaming.set_volume(streaming.volume() + STREAM_VOLUME_STEP).await;
                }
            }
            KeyCode::Char(',') => {
                if let Some(streaming) = &self.streaming {
                    streaming.set_volume(streaming.volume() - STREAM_VOLUME_STEP).await;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Left-button press, drag and release drive the carousel gesture
    pub async fn handle_mouse_event(&self, mouse: MouseEvent) -> Result<()> {
        let Some(carousel) = self.video.carousel() else {
            return Ok(());
        };
        let x = mouse.column as f64 * DRAG_UNITS_PER_COLUMN;

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => carousel.begin_drag(x).await,
            MouseEventKind::Drag(MouseButton::Left) => carousel.drag_to(x).await,
            MouseEventKind::Up(MouseButton::Left) => carousel.end_drag().await,
            _ => {}
        }
        Ok(())
    }
}
