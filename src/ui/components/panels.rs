//! Loading and error placeholders shared by the views.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Pulsing-row placeholder shown while the first fetch is running.
pub fn render_skeleton(frame: &mut Frame, area: Rect, label: &str, rows: usize) {
  let mut lines = vec![
    Line::styled(label.to_string(), Style::default().fg(Color::DarkGray)),
    Line::raw(""),
  ];
  for i in 0..rows {
    let width = 12 + (i * 7) % 24;
    lines.push(Line::from(vec![
      Span::styled("  ●  ", Style::default().fg(Color::DarkGray)),
      Span::styled("░".repeat(width), Style::default().fg(Color::DarkGray)),
    ]));
  }
  frame.render_widget(Paragraph::new(lines), area);
}

/// Error panel with the message and how to retry.
pub fn render_error_panel(frame: &mut Frame, area: Rect, title: &str, message: &str, hint: &str) {
  let block = Block::default()
    .title(format!(" {} ", title))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Red));

  let lines = vec![
    Line::raw(""),
    Line::styled(message.to_string(), Style::default().fg(Color::Red)),
    Line::raw(""),
    Line::styled(hint.to_string(), Style::default().fg(Color::DarkGray)),
  ];

  let paragraph = Paragraph::new(lines)
    .block(block)
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
  frame.render_widget(paragraph, centered(area, 70, 8));
}

/// Center a box of `percent_x` width and `height` rows inside `area`.
fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
  let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
  let width = width.max(20).min(area.width);
  let height = height.min(area.height);
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_centered_fits_inside_area() {
    let area = Rect::new(0, 0, 100, 40);
    let rect = centered(area, 70, 8);
    assert_eq!(rect, Rect::new(15, 16, 70, 8));
  }

  #[test]
  fn test_centered_on_very_wide_area() {
    let area = Rect::new(0, 0, 1000, 40);
    let rect = centered(area, 70, 8);
    assert_eq!(rect, Rect::new(150, 16, 700, 8));
  }

  #[test]
  fn test_centered_small_area() {
    let area = Rect::new(2, 1, 10, 3);
    let rect = centered(area, 70, 8);
    assert_eq!(rect, Rect::new(2, 1, 10, 3));
  }
}
