use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by a prompt that the parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
  /// Value edited (emitted on each keystroke)
  Changed(String),
  /// Enter pressed, overlay closed
  Submitted(String),
  /// Esc pressed, overlay closed
  Cancelled,
}

/// One-line input overlay, opened by the parent view
#[derive(Debug, Clone, Default)]
pub struct PromptInput {
  input: TextInput,
  active: bool,
  title: String,
  prefix: &'static str,
}

impl PromptInput {
  pub fn new(prefix: &'static str) -> Self {
    Self {
      prefix,
      ..Default::default()
    }
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the prompt pre-filled with `initial`
  pub fn activate(&mut self, title: impl Into<String>, initial: &str) {
    self.active = true;
    self.title = title.into();
    self.input.set_value(initial);
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<PromptEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(value) => {
        self.active = false;
        KeyResult::Event(PromptEvent::Submitted(value))
      }
      InputResult::Cancelled => {
        self.active = false;
        KeyResult::Event(PromptEvent::Cancelled)
      }
      InputResult::Changed => KeyResult::Event(PromptEvent::Changed(self.input.value().to_string())),
      // Swallow everything else while open
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30.min(area.width), 60);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, 3).intersection(area);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);
    if inner.height == 0 {
      return;
    }

    let line = Line::from(vec![
      Span::styled(self.prefix, Style::default().fg(Color::Yellow)),
      Span::raw(self.input.value()),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
    self.input.set_cursor(frame, inner, self.prefix);
  }
}
