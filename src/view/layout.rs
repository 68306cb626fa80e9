//! Header and key hints

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::PageSnapshot;

pub fn render_top_bar(frame: &mut Frame, area: Rect, page: &PageSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Key hints
            Constraint::Length(25), // Device name
        ])
        .split(area);

    let hints = if page.streaming.is_some() {
        "␣ play  m mute  +/- vol  ←/→ track  s/n/p stream  [/] seek  ,/. stream vol  q quit"
    } else {
        "␣ play  m mute  +/- vol  ←/→ track  1-9 select  t thumbnail  q quit"
    };
    let help = Paragraph::new(hints)
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Landing Player ")
                .padding(Padding::horizontal(1)),
        );
    frame.render_widget(help, chunks[0]);

    let device_name = page
        .streaming
        .as_ref()
        .and_then(|s| s.device_id.as_deref())
        .unwrap_or("-");
    let device = Paragraph::new(format!("🎵 {}", device_name))
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(" Device "));
    frame.render_widget(device, chunks[1]);
}
