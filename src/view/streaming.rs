//! Streaming player panel

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::model::StreamingPlayerState;
use super::utils::format_duration;

pub fn render_streaming_panel(frame: &mut Frame, area: Rect, streaming: Option<&StreamingPlayerState>) {
    let Some(state) = streaming else {
        let hint = Paragraph::new(" Set SPOTIFY_ACCESS_TOKEN to enable the streaming player")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Streaming "));
        frame.render_widget(hint, area);
        return;
    };

    let readiness = match (&state.device_id, state.is_ready) {
        (Some(id), true) => format!(" ● {} ", id),
        (Some(id), false) => format!(" ○ {} (offline) ", id),
        (None, _) => " ○ Connecting... ".to_string(),
    };

    let status_text = match &state.current_track {
        None if state.is_active => " Nothing playing".to_string(),
        None => " Waiting for playback".to_string(),
        Some(track) => {
            let icon = if state.is_paused { "⏸ " } else { " ▶" };
            format!("{} {} | {} ({})", icon, track.name, track.artist_line(), track.album)
        }
    };

    let time_str = format!(
        "{} / {}",
        format_duration(state.position),
        format_duration(state.duration)
    );
    let progress_ratio = if state.duration > 0 {
        (state.position as f64 / state.duration as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} ", status_text))
                .title_bottom(Line::from(readiness).right_aligned()),
        )
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(progress_ratio)
        .label(time_str);

    frame.render_widget(gauge, area);
}
