pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::TableState;
use renderfns::{draw_footer, draw_header};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let area = frame.area();
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(area);

  let api_url = app.api_url();
  let breadcrumb = app.view_breadcrumb();
  let message = app.status_message().map(str::to_string);

  if let Some(view) = app.current_view_mut() {
    let route = view.route().to_string();
    draw_header(frame, chunks[0], &api_url, &route, &view.shortcuts());
    view.render(frame, chunks[1]);
  }

  draw_footer(frame, chunks[2], &breadcrumb, message.as_deref());

  app.command_input().render_overlay(frame, area);
}

/// Move the table selection by `delta`, wrapping at both ends
pub fn move_selection(state: &mut TableState, len: usize, delta: i32) {
  if len == 0 {
    state.select(None);
    return;
  }
  let current = state.selected().unwrap_or(0) as i32;
  state.select(Some((current + delta).rem_euclid(len as i32) as usize));
}

/// Keep the selection inside `0..len`, selecting the first row when there is none
pub fn ensure_valid_selection(state: &mut TableState, len: usize) {
  match state.selected() {
    _ if len == 0 => state.select(None),
    Some(idx) if idx >= len => state.select(Some(len - 1)),
    None => state.select(Some(0)),
    _ => {}
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_move_selection_wraps() {
    let mut state = TableState::default();
    move_selection(&mut state, 3, -1);
    assert_eq!(state.selected(), Some(2));
    move_selection(&mut state, 3, 1);
    assert_eq!(state.selected(), Some(0));
  }

  #[test]
  fn test_move_selection_empty() {
    let mut state = TableState::default().with_selected(Some(4));
    move_selection(&mut state, 0, 1);
    assert_eq!(state.selected(), None);
  }

  #[test]
  fn test_ensure_valid_selection() {
    let mut state = TableState::default();
    ensure_valid_selection(&mut state, 5);
    assert_eq!(state.selected(), Some(0));

    state.select(Some(9));
    ensure_valid_selection(&mut state, 5);
    assert_eq!(state.selected(), Some(4));

    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }
}
