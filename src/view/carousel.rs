//! Carousel card rendering

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::model::CarouselSnapshot;
use super::utils::{format_seconds, truncate_string};

pub fn render_carousel(frame: &mut Frame, area: Rect, carousel: &CarouselSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Cards
            Constraint::Length(1), // Indicators
        ])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20), // Previous
            Constraint::Percentage(60), // Current
            Constraint::Percentage(20), // Next
        ])
        .split(chunks[0]);

    // Neighbours are previews only. The drag offset is printed on the current card, not applied to layout.
    let previous = carousel
        .current_index
        .checked_sub(1)
        .and_then(|i| carousel.track_ids.get(i));
    let next = carousel.track_ids.get(carousel.current_index + 1);
    render_neighbour(frame, cards[0], previous, " ◀ ");
    render_current(frame, cards[1], carousel);
    render_neighbour(frame, cards[2], next, " ▶ ");

    render_indicators(frame, chunks[1], carousel);
}

fn render_neighbour(frame: &mut Frame, area: Rect, track_id: Option<&String>, title: &str) {
    let text = match track_id {
        Some(id) => id.as_str(),
        None => "",
    };
    let widget = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(title),
        );
    frame.render_widget(widget, area);
}

fn render_current(frame: &mut Frame, area: Rect, carousel: &CarouselSnapshot) {
    let playback = &carousel.playback;
    let border = if carousel.gesture.is_dragging {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Green)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(format!(" {}/{} ", carousel.current_index + 1, carousel.track_ids.len()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Title + thumbnail
            Constraint::Length(3), // Progress
        ])
        .split(inner);

    let title = if playback.title.is_empty() {
        "Loading...".to_string()
    } else {
        truncate_string(&playback.title, rows[0].width.saturating_sub(2) as usize)
    };
    let thumbnail = carousel
        .thumbnails
        .get(carousel.current_index)
        .map(|t| t.url())
        .unwrap_or_default();

    let mut lines = vec![
        Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(thumbnail, Style::default().fg(Color::DarkGray))),
    ];
    if carousel.gesture.is_dragging {
        lines.push(Line::from(format!("drag {:+.0}", carousel.gesture.drag_translate_x)));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), rows[0]);

    let status = if playback.is_playing { " ▶ " } else { " ⏸ " };
    let volume_text = if playback.is_silent() {
        format!(" Muted ({}%) ", playback.volume)
    } else {
        format!(" Vol: {}% ", playback.volume)
    };
    let time_str = format!(
        "{} / {}",
        format_seconds(playback.current_time),
        format_seconds(playback.duration)
    );

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(status)
                .title_bottom(Line::from(volume_text).right_aligned()),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(playback.progress_ratio())
        .label(time_str);
    frame.render_widget(gauge, rows[1]);
}

fn render_indicators(frame: &mut Frame, area: Rect, carousel: &CarouselSnapshot) {
    let spans: Vec<Span> = (0..carousel.track_ids.len())
        .map(|i| {
            if i == carousel.current_index {
                Span::styled(" ● ", Style::default().fg(Color::Green))
            } else {
                Span::styled(" ○ ", Style::default().fg(Color::DarkGray))
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)).alignment(Alignment::Center), area);
}
