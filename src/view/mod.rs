//! View module - UI rendering
//!
//! This module renders the host page using ratatui. It is organized into
//! submodules by component type:
//!
//! - `utils`: Shared formatting helpers
//! - `layout`: Top bar with key hints and device
//! - `carousel`: Video carousel card, neighbours and indicators
//! - `streaming`: Streaming player panel
//! - `overlays`: Diagnostic notification

mod utils;
mod layout;
mod carousel;
mod streaming;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::PageSnapshot;

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, page: &PageSnapshot) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Key hints + device
                Constraint::Min(0),    // Carousel
                Constraint::Length(3), // Streaming player
            ])
            .split(frame.area());

        layout::render_top_bar(frame, chunks[0], page);

        carousel::render_carousel(frame, chunks[1], &page.carousel);

        streaming::render_streaming_panel(frame, chunks[2], page.streaming.as_ref());

        if let Some(diagnostic) = &page.diagnostic {
            overlays::render_diagnostic(frame, diagnostic);
        }
    }
}
