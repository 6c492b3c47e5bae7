use crate::api::CachedApiClient;
use crate::commands::{self, Action};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::route::{normalize_page, Route};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{CharacterDetailView, CharacterListView};
use color_eyre::Result;
use crossterm::event::{DisableFocusChange, EnableFocusChange, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Command palette (after pressing :)
  command_input: CommandInput,

  /// Cached API client shared by every view
  api: CachedApiClient,

  /// Last command error, shown in the footer until the next key press
  status_message: Option<String>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: &Config, route: Route) -> Result<Self> {
    let api = CachedApiClient::new(config)?;
    Ok(Self::with_api(api, route))
  }

  pub fn with_api(api: CachedApiClient, route: Route) -> Self {
    let mut app = Self {
      view_stack: Vec::new(),
      command_input: CommandInput::new(),
      api,
      status_message: None,
      should_quit: false,
    };
    app.open(route);
    app
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableFocusChange)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal
    stdout().execute(DisableFocusChange)?;
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(100));
    info!(route = %self.current_route(), "started");

    while !self.should_quit() {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::FocusGained => self.handle_focus(),
      Event::Resize | Event::Tick => {}
    }

    // Pick up finished fetches whatever woke us
    if let Some(view) = self.view_stack.last_mut() {
      view.tick();
    }
  }

  fn handle_focus(&mut self) {
    if !self.api.query_config().refetch_on_focus {
      return;
    }
    debug!("terminal focused, refetching stale queries");
    if let Some(view) = self.view_stack.last_mut() {
      view.on_focus();
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    if !self.command_input.is_active() {
      self.status_message = None;
    }

    match self.command_input.handle_key(key) {
      KeyResult::Event(CommandEvent::Submitted(line)) => {
        self.execute_command(&line);
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    // Swallow stray keys while the palette is open
    if self.command_input.is_active() {
      return;
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };

    match action {
      ViewAction::None => {}
      ViewAction::Navigate(route) => self.push(route),
      ViewAction::Pop => self.pop(),
    }
  }

  fn execute_command(&mut self, line: &str) {
    let Some(action) = commands::parse(line) else {
      if !line.trim().is_empty() {
        self.fail(format!("Unknown command: {}", line.trim()));
      }
      return;
    };

    debug!(?action, "executing command");
    match action {
      Action::Characters => self.open(Route::default()),
      Action::Page(raw) => self.open(Route::CharacterList {
        page: normalize_page(Some(&raw)),
      }),
      Action::Character(id) if id.trim().is_empty() => {
        self.fail("Usage: character <id>".to_string())
      }
      Action::Character(id) => self.open(Route::CharacterDetail {
        id: id.trim().to_string(),
      }),
      Action::Open(raw) => match Route::parse(&raw) {
        Ok(route) => self.open(route),
        Err(e) => self.fail(e.to_string()),
      },
      Action::Quit => self.should_quit = true,
    }
  }

  fn fail(&mut self, message: String) {
    warn!(%message, "command failed");
    self.status_message = Some(message);
  }

  /// Go to a route: list routes replace the whole stack, detail routes are
  /// pushed on top of the list they were opened from.
  fn open(&mut self, route: Route) {
    match route {
      Route::CharacterList { .. } => {
        self.view_stack.clear();
        self.push(route);
      }
      Route::CharacterDetail { .. } => {
        if self.view_stack.is_empty() {
          self.push(Route::default());
        }
        self.push(route);
      }
    }
  }

  fn push(&mut self, route: Route) {
    info!(%route, "navigating");
    let view: Box<dyn View> = match route {
      Route::CharacterList { page } => Box::new(CharacterListView::new(page, self.api.clone())),
      Route::CharacterDetail { id } => Box::new(CharacterDetailView::new(id, &self.api)),
    };
    self.view_stack.push(view);
  }

  fn pop(&mut self) {
    if self.view_stack.len() > 1 {
      self.view_stack.pop();
    } else {
      self.should_quit = true;
    }
  }

  // Accessors for UI rendering
  pub fn current_view_mut(&mut self) -> Option<&mut (dyn View + 'static)> {
    self.view_stack.last_mut().map(|view| view.as_mut())
  }

  pub fn current_route(&self) -> Route {
    self
      .view_stack
      .last()
      .map(|view| view.route())
      .unwrap_or_default()
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command_input
  }

  pub fn status_message(&self) -> Option<&str> {
    self.status_message.as_deref()
  }

  pub fn api_url(&self) -> String {
    self.api.base_url().to_string()
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|view| view.route().to_string())
      .collect()
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }
}
