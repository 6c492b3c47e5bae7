use crate::api::types::{Character, Page};
use crate::api::{CachedApiClient, PageQuery};
use crate::cache::{QueryKey, RefetchHandle};
use crate::route::Route;
use crate::ui::components::{render_error_panel, render_skeleton};
use crate::ui::renderfns::{status_presentation, truncate, EMERALD};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::{ensure_valid_selection, move_selection};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use tracing::debug;

/// Pagination controls derived from a loaded page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
  pub caption: String,
  pub page_label: String,
  pub prev_enabled: bool,
  pub next_enabled: bool,
}

impl Pagination {
  pub fn new(page: u32, data: &Page) -> Self {
    Self {
      caption: format!(
        "Showing {} of {} characters",
        data.results.len(),
        data.info.count
      ),
      page_label: format!("Page {} of {}", page, data.info.pages),
      prev_enabled: data.has_prev(),
      next_enabled: data.has_next(),
    }
  }
}

/// Paginated table of characters (`/?page=N`)
pub struct CharacterListView {
  api: CachedApiClient,
  page: u32,
  query: PageQuery,
  table_state: TableState,
  refresh: Option<RefetchHandle>,
}

impl CharacterListView {
  pub fn new(page: u32, api: CachedApiClient) -> Self {
    let page = page.max(1);
    let query = api.characters_page(page);

    Self {
      api,
      page,
      query,
      table_state: TableState::default(),
      refresh: None,
    }
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn is_refreshing(&self) -> bool {
    self.refresh.is_some()
  }

  fn characters(&self) -> &[Character] {
    self
      .query
      .data()
      .map(|page| page.results.as_slice())
      .unwrap_or(&[])
  }

  fn pagination(&self) -> Option<Pagination> {
    self.query.data().map(|data| Pagination::new(self.page, data))
  }

  /// Switch to another page. A new page is a new cache key, so no invalidation is needed.
  fn set_page(&mut self, page: u32) {
    if page == self.page || page == 0 {
      return;
    }
    debug!(from = self.page, to = page, "changing page");
    self.page = page;
    self.query = self.api.characters_page(page);
    self.table_state = TableState::default();
    self.refresh = None;
  }

  fn previous_page(&mut self) {
    if self.pagination().is_some_and(|p| p.prev_enabled) {
      self.set_page(self.page - 1);
    }
  }

  fn next_page(&mut self) {
    if self.pagination().is_some_and(|p| p.next_enabled) {
      self.set_page(self.page + 1);
    }
  }

  /// Manual refresh: force a refetch of the current page and track it until done.
  fn refresh(&mut self) {
    if self.is_refreshing() || self.query.is_loading() {
      return;
    }
    debug!(query = %self.query.key().description(), "manual refresh");
    self.refresh = Some(self.query.refetch());
  }

  fn render_page(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Characters ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if self.query.is_loading() {
      render_skeleton(frame, inner, "Loading characters...", 10);
      return;
    }

    if let Some(error) = self.query.error() {
      render_error_panel(
        frame,
        inner,
        "Error Loading Characters",
        &error.to_string(),
        "Press r to try again",
      );
      return;
    }

    let Some(pagination) = self.pagination() else {
      return;
    };

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Caption
        Constraint::Min(1),    // Table
        Constraint::Length(1), // Pagination
      ])
      .split(inner);

    // Caption
    let mut caption = vec![Span::styled(
      pagination.caption.clone(),
      Style::default().fg(Color::Gray),
    )];
    if self.is_refreshing() {
      caption.push(Span::styled(
        "  ↻ refreshing...",
        Style::default().fg(EMERALD),
      ));
    }
    frame.render_widget(Paragraph::new(Line::from(caption)), chunks[0]);

    // Table
    let len = self.characters().len();
    ensure_valid_selection(&mut self.table_state, len);

    let header = Row::new(["Name", "Status", "Species", "Gender", "Origin"])
      .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = self
      .characters()
      .iter()
      .map(|character| {
        let status = status_presentation(character.status);
        Row::new(vec![
          Cell::from(truncate(&character.name, 28)).style(Style::default().fg(Color::White).bold()),
          Cell::from(format!("{} {}", status.icon, status.label))
            .style(Style::default().fg(status.color)),
          Cell::from(truncate(&character.species, 16)),
          Cell::from(character.gender.clone()),
          Cell::from(truncate(&character.origin.name, 32)),
        ])
      })
      .collect();

    let table = Table::new(
      rows,
      [
        Constraint::Length(30),
        Constraint::Length(11),
        Constraint::Length(18),
        Constraint::Length(11),
        Constraint::Min(10),
      ],
    )
    .header(header)
    .row_highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

    frame.render_stateful_widget(table, chunks[1], &mut self.table_state);

    // Pagination
    let control = |label: &'static str, enabled: bool| {
      let style = if enabled {
        Style::default().fg(Color::Cyan)
      } else {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
      };
      Span::styled(label, style)
    };
    let footer = Line::from(vec![
      Span::styled(pagination.page_label, Style::default().fg(Color::Gray)),
      Span::raw("   "),
      control("◀ prev", pagination.prev_enabled),
      Span::raw("  "),
      control("next ▶", pagination.next_enabled),
    ]);
    frame.render_widget(Paragraph::new(footer), chunks[2]);
  }
}

impl View for CharacterListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        let len = self.characters().len();
        move_selection(&mut self.table_state, len, 1);
      }
      KeyCode::Char('k') | KeyCode::Up => {
        let len = self.characters().len();
        move_selection(&mut self.table_state, len, -1);
      }
      KeyCode::Char('h') | KeyCode::Left => self.previous_page(),
      KeyCode::Char('l') | KeyCode::Right => self.next_page(),
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Enter => {
        let selected = self
          .table_state
          .selected()
          .and_then(|idx| self.characters().get(idx));
        if let Some(character) = selected {
          return ViewAction::Navigate(Route::CharacterDetail {
            id: character.id.to_string(),
          });
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_page(frame, area);
  }

  fn route(&self) -> Route {
    Route::CharacterList { page: self.page }
  }

  fn tick(&mut self) {
    self.query.poll();
    // The flag clears when the refetch completes, whatever the outcome
    if self.refresh.as_ref().is_some_and(RefetchHandle::is_finished) {
      self.refresh = None;
    }
  }

  fn on_focus(&mut self) {
    self.query.refetch_if_stale();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("h/l", "page").with_priority(20),
      ShortcutInfo::new("enter", "open").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}
