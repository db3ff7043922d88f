use crate::api::{ApiClient, ScrapeAck};
use crate::commands::CommandKind;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::query::{Mutation, QueryClient, QueryError};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::StatusMessage;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{AnalyticsView, DashboardView, JobListView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

const TICK_RATE: Duration = Duration::from_millis(250);
const STATUS_TTL: Duration = Duration::from_secs(5);

/// What every view needs to reach the backend and the cache
#[derive(Clone)]
pub struct AppContext {
  pub api: ApiClient,
  pub queries: QueryClient,
  pub config: Arc<Config>,
}

/// Main application state
pub struct App {
  ctx: AppContext,
  /// Navigation stack, root at index 0
  view_stack: Vec<Box<dyn View>>,
  command: CommandInput,
  scrape: Mutation<ScrapeAck>,
  status: Option<(StatusMessage, Instant)>,
  should_quit: bool,
}

impl App {
  pub fn new(ctx: AppContext) -> Self {
    let api = ctx.api.clone();
    let scrape = Mutation::new(move || {
      let api = api.clone();
      async move { api.trigger_scraping().await.map_err(QueryError::from) }
    });

    let root: Box<dyn View> = Box::new(DashboardView::new(ctx.clone()));
    Self {
      ctx,
      view_stack: vec![root],
      command: CommandInput::new(),
      scrape,
      status: None,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let result = self.event_loop().await;

    // Abort in-flight requests and interval timers
    self.view_stack.clear();
    self.ctx.queries.clear();

    // Restore the terminal even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(TICK_RATE);
    info!(api = %self.ctx.api.base_url(), "jobpulse started");

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        Some(Event::Resize) => {}
        None => break,
      }
    }

    info!("jobpulse exiting");
    Ok(())
  }

  fn tick(&mut self) {
    if let Some(view) = self.view_stack.last_mut() {
      view.tick();
    }

    if self.scrape.poll() {
      let state = self.scrape.state();
      let outcome = match (state.data(), state.error()) {
        (Some(ack), _) => Some(Ok(ack.clone())),
        (None, Some(e)) => Some(Err(e.clone())),
        (None, None) => None,
      };
      // Reported once, then back to idle for the next trigger
      self.scrape.reset();
      match outcome {
        Some(Ok(ack)) => {
          info!(task_id = ?ack.task_id, "Scraping triggered");
          // New postings are on their way
          self.ctx.queries.invalidate_all();
          let message = match (ack.message, ack.task_id) {
            (Some(message), _) => message,
            (None, Some(task)) => format!("Scraping started (task {})", task),
            (None, None) => "Scraping started".to_string(),
          };
          self.set_status(StatusMessage::Info(message));
        }
        Some(Err(e)) => {
          error!(error = %e, "Failed to trigger scraping");
          self.set_status(StatusMessage::Error(format!("Scrape failed: {}", e)));
        }
        None => {}
      }
    }

    if let Some((_, since)) = &self.status {
      if since.elapsed() > STATUS_TTL {
        self.status = None;
      }
    }
  }

  fn set_status(&mut self, message: StatusMessage) {
    self.status = Some((message, Instant::now()));
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let capturing = self.current_view().is_some_and(|v| v.is_capturing_input());
    if !capturing {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Run(kind)) => return self.run_command(kind),
        KeyResult::Event(CommandEvent::Unknown(input)) => {
          return self.set_status(StatusMessage::Error(format!("Unknown command: {}", input)));
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn run_command(&mut self, kind: CommandKind) {
    match kind {
      CommandKind::Dashboard => self.set_root(Box::new(DashboardView::new(self.ctx.clone()))),
      CommandKind::Jobs => self.set_root(Box::new(JobListView::from_context(&self.ctx))),
      CommandKind::Analytics => self.set_root(Box::new(AnalyticsView::new(self.ctx.clone()))),
      CommandKind::Scrape => {
        if self.scrape.is_pending() {
          self.set_status(StatusMessage::Info("Scrape request already pending".to_string()));
        } else {
          self.scrape.mutate();
          self.set_status(StatusMessage::Info("Requesting scrape...".to_string()));
        }
      }
      CommandKind::Refresh => {
        if let Some(view) = self.view_stack.last_mut() {
          view.refresh();
        }
      }
      CommandKind::Quit => self.should_quit = true,
    }
  }

  /// Replace the whole stack with a new root view
  fn set_root(&mut self, view: Box<dyn View>) {
    // Dropped views unsubscribe their observers
    self.view_stack.clear();
    self.view_stack.push(view);
  }

  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self.view_stack.iter().map(|v| v.breadcrumb_label()).collect()
  }

  pub fn context(&self) -> &AppContext {
    &self.ctx
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command
  }

  pub fn status(&self) -> Option<&StatusMessage> {
    self.status.as_ref().map(|(message, _)| message)
  }
}
