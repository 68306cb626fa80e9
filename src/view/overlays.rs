//! Overlay rendering (diagnostic notification)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::error::Diagnostic;

pub fn render_diagnostic(frame: &mut Frame, diagnostic: &Diagnostic) {
    let area = frame.area();
    let message = diagnostic.error.to_string();

    let popup_width = 52.min(area.width.saturating_sub(4));
    let inner_width = popup_width.saturating_sub(4).max(1) as usize;

    let line_count = ((message.chars().count() as f32) / (inner_width as f32)).ceil() as u16;

    // Top border + message lines + bottom border
    let popup_height = (2 + line_count.max(1)).min(area.height.saturating_sub(4));

    let popup_area = Rect {
        x: area.width.saturating_sub(popup_width) / 2,
        y: area.height.saturating_sub(popup_height) / 2,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let widget = Paragraph::new(message)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(format!(" {} error (Esc to dismiss) ", diagnostic.source))
                .title_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .style(Style::default().bg(Color::Black)),
        );

    frame.render_widget(widget, popup_area);
}
