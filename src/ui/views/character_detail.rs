use crate::api::types::Character;
use crate::api::{CachedApiClient, CharacterQuery};
use crate::cache::RefetchHandle;
use crate::route::Route;
use crate::ui::components::{render_error_panel, render_skeleton};
use crate::ui::renderfns::status_presentation;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Single character page (`/character/{id}`)
pub struct CharacterDetailView {
  id: String,
  query: CharacterQuery,
  retry: Option<RefetchHandle>,
}

impl CharacterDetailView {
  pub fn new(id: String, api: &CachedApiClient) -> Self {
    let query = api.character(&id);
    Self {
      id,
      query,
      retry: None,
    }
  }

  fn retry(&mut self) {
    if self.retry.is_some() || self.query.is_loading() {
      return;
    }
    self.retry = Some(self.query.refetch());
  }
}

fn field<'a>(label: &'a str, value: impl Into<Span<'a>>) -> Line<'a> {
  Line::from(vec![
    Span::styled(format!("{:<22}", label), Style::default().fg(Color::DarkGray)),
    value.into(),
  ])
}

fn character_lines(character: &Character) -> Vec<Line<'_>> {
  let status = status_presentation(character.status);

  let mut lines = vec![
    Line::styled(
      character.name.as_str(),
      Style::default().fg(Color::White).bold(),
    ),
    Line::raw(""),
    field(
      "Status",
      Span::styled(
        format!("{} {}", status.icon, status.label),
        Style::default().fg(status.color).bold(),
      ),
    ),
    field("Species", Span::raw(character.species.as_str())),
  ];

  if let Some(kind) = &character.kind {
    lines.push(field("Type", Span::raw(kind.as_str())));
  }

  lines.extend([
    field("Gender", Span::raw(character.gender.as_str())),
    field("Origin", Span::raw(character.origin.name.as_str())),
    field("Last Known Location", Span::raw(character.location.name.as_str())),
    field(
      "Episodes",
      Span::raw(format!("{} episodes", character.episode.len())),
    ),
    field(
      "Created",
      Span::raw(character.created.format("%Y-%m-%d").to_string()),
    ),
    Line::raw(""),
    field(
      "Image",
      Span::styled(character.image.as_str(), Style::default().fg(Color::Blue)),
    ),
  ]);

  lines
}

impl View for CharacterDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => self.retry(),
      KeyCode::Char('q') | KeyCode::Esc | KeyCode::Backspace => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = match self.query.data() {
      Some(character) => format!(" {} ", character.name),
      None => format!(" Character {} ", self.id),
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if self.query.is_loading() {
      render_skeleton(frame, inner, "Loading character...", 6);
      return;
    }

    if let Some(error) = self.query.error() {
      render_error_panel(
        frame,
        inner,
        "Error Loading Character",
        &error.to_string(),
        "Press r to retry or q to go back to characters",
      );
      return;
    }

    if let Some(character) = self.query.data() {
      let paragraph = Paragraph::new(character_lines(character)).wrap(Wrap { trim: false });
      frame.render_widget(paragraph, inner.inner(Margin::new(2, 1)));
    }
  }

  fn route(&self) -> Route {
    Route::CharacterDetail {
      id: self.id.clone(),
    }
  }

  fn tick(&mut self) {
    self.query.poll();
    if self.retry.as_ref().is_some_and(RefetchHandle::is_finished) {
      self.retry = None;
    }
  }

  fn on_focus(&mut self) {
    self.query.refetch_if_stale();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("r", "reload").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::client::ApiClient;
  use crate::api::types::fixtures::{character_json, rick_json};
  use crate::cache::QueryConfig;
  use crate::ui::renderfns::EMERALD;
  use crate::ui::test_utils::{find_cell, key, render_buffer, render_to_string};
  use std::time::Duration;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn api_for(server: &MockServer) -> CachedApiClient {
    let inner = ApiClient::with_base_url(&server.uri()).unwrap();
    CachedApiClient::with_client(inner, QueryConfig::default())
  }

  async fn settle(view: &mut CharacterDetailView) {
    for _ in 0..200 {
      view.tick();
      if !view.query.is_fetching() && view.retry.is_none() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
  }

  #[tokio::test]
  async fn test_renders_rick() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/character/1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(rick_json()))
      .mount(&mock_server)
      .await;

    let mut view = CharacterDetailView::new("1".into(), &api_for(&mock_server));
    settle(&mut view).await;
    assert!(view.query.is_success());

    let buffer = render_buffer(100, 30, |frame| {
      let area = frame.area();
      view.render(frame, area)
    });
    let screen = crate::ui::test_utils::buffer_text(&buffer);
    assert!(screen.contains("Rick Sanchez"));
    assert!(screen.contains("♥ Alive"));
    assert!(screen.contains("Earth (C-137)"));
    assert!(screen.contains("Citadel of Ricks"));
    assert!(screen.contains("2 episodes"));
    assert!(screen.contains("2017-11-04"));
    // No type row when the API sends an empty type
    assert!(!screen.contains("Type "));

    let heart = find_cell(&buffer, "♥").expect("status icon rendered");
    assert_eq!(heart.fg, EMERALD);
  }

  #[tokio::test]
  async fn test_renders_type_when_present() {
    let mock_server = MockServer::start().await;
    let mut body = character_json(7, "Abradolf Lincler", "unknown");
    body["type"] = serde_json::json!("Genetic experiment");
    Mock::given(method("GET"))
      .and(path("/character/7"))
      .respond_with(ResponseTemplate::new(200).set_body_json(body))
      .mount(&mock_server)
      .await;

    let mut view = CharacterDetailView::new("7".into(), &api_for(&mock_server));
    settle(&mut view).await;

    let screen = render_to_string(100, 30, |frame| {
      let area = frame.area();
      view.render(frame, area)
    });
    assert!(screen.contains("Genetic experiment"));
    assert!(screen.contains("? unknown"));
  }

  #[tokio::test]
  async fn test_not_found_shows_error_panel() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/character/99999"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&mock_server)
      .await;

    let mut view = CharacterDetailView::new("99999".into(), &api_for(&mock_server));
    settle(&mut view).await;
    assert!(view.query.is_error());

    let screen = render_to_string(100, 30, |frame| {
      let area = frame.area();
      view.render(frame, area)
    });
    assert!(screen.contains("Error Loading Character"));
    assert!(screen.contains("character not found"));
    assert!(screen.contains("Press r to retry"));
  }

  #[tokio::test]
  async fn test_retry_after_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/character/1"))
      .respond_with(ResponseTemplate::new(503))
      .up_to_n_times(1)
      .mount(&mock_server)
      .await;
    Mock::given(method("GET"))
      .and(path("/character/1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(rick_json()))
      .mount(&mock_server)
      .await;

    let mut view = CharacterDetailView::new("1".into(), &api_for(&mock_server));
    settle(&mut view).await;
    assert!(view.query.is_error());

    view.handle_key(key(KeyCode::Char('r')));
    assert!(view.query.snapshot().is_fetching || view.retry.is_some());
    settle(&mut view).await;

    assert!(view.query.is_success());
    assert_eq!(view.query.data().map(|c| c.name.as_str()), Some("Rick Sanchez"));
  }

  #[tokio::test]
  async fn test_back_and_route() {
    let mock_server = MockServer::start().await;
    let mut view = CharacterDetailView::new("42".into(), &api_for(&mock_server));
    assert_eq!(view.route(), Route::CharacterDetail { id: "42".into() });
    assert!(matches!(view.handle_key(key(KeyCode::Char('q'))), ViewAction::Pop));
  }
}
