use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;

/// Result of handling a key event in an input component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
  /// Buffer or cursor changed
  Changed,
  /// Enter pressed, here's the submitted value
  Submitted(String),
  Cancelled,
  /// Key not handled, pass to next handler
  NotHandled,
}

/// Single-line text buffer.
///
/// The cursor counts characters, not bytes, so non-ASCII input ("Nyeri",
/// "Murang'a", "Café") edits correctly.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
  buffer: String,
  cursor: usize,
}

impl TextInput {
  pub fn value(&self) -> &str {
    &self.buffer
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
    self.cursor = 0;
  }

  /// Replace the buffer and move the cursor to the end
  pub fn set_value(&mut self, value: &str) {
    self.buffer = value.to_string();
    self.cursor = self.char_count();
  }

  #[cfg(test)]
  pub fn cursor_position(&self) -> usize {
    self.cursor
  }

  /// Place the terminal cursor for a buffer drawn at `area` after `prefix`
  pub fn set_cursor(&self, frame: &mut Frame, area: Rect, prefix: &str) {
    if area.width == 0 || area.height == 0 {
      return;
    }
    let offset = prefix.chars().count() + self.cursor;
    let x = area.x.saturating_add(u16::try_from(offset).unwrap_or(u16::MAX));
    frame.set_cursor_position(Position::new(x.min(area.right() - 1), area.y));
  }

  fn char_count(&self) -> usize {
    self.buffer.chars().count()
  }

  fn byte_offset(&self, char_idx: usize) -> usize {
    self
      .buffer
      .char_indices()
      .nth(char_idx)
      .map(|(i, _)| i)
      .unwrap_or(self.buffer.len())
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> InputResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Esc => InputResult::Cancelled,
      KeyCode::Enter => InputResult::Submitted(self.buffer.clone()),
      KeyCode::Backspace => {
        if self.cursor > 0 {
          self.cursor -= 1;
          let at = self.byte_offset(self.cursor);
          self.buffer.remove(at);
        }
        InputResult::Changed
      }
      KeyCode::Delete => {
        if self.cursor < self.char_count() {
          let at = self.byte_offset(self.cursor);
          self.buffer.remove(at);
        }
        InputResult::Changed
      }
      KeyCode::Left => {
        self.cursor = self.cursor.saturating_sub(1);
        InputResult::Changed
      }
      KeyCode::Right => {
        self.cursor = (self.cursor + 1).min(self.char_count());
        InputResult::Changed
      }
      KeyCode::Home => {
        self.cursor = 0;
        InputResult::Changed
      }
      KeyCode::End => {
        self.cursor = self.char_count();
        InputResult::Changed
      }
      KeyCode::Char('a') if ctrl => {
        self.cursor = 0;
        InputResult::Changed
      }
      KeyCode::Char('e') if ctrl => {
        self.cursor = self.char_count();
        InputResult::Changed
      }
      KeyCode::Char('u') if ctrl => {
        let at = self.byte_offset(self.cursor);
        self.buffer.replace_range(..at, "");
        self.cursor = 0;
        InputResult::Changed
      }
      KeyCode::Char('w') if ctrl => {
        let end = self.byte_offset(self.cursor);
        let start = self.buffer[..end]
          .trim_end()
          .rfind(' ')
          .map(|i| i + 1)
          .unwrap_or(0);
        let removed = self.buffer[start..end].chars().count();
        self.buffer.replace_range(start..end, "");
        self.cursor -= removed;
        InputResult::Changed
      }
      KeyCode::Char(_) if ctrl => InputResult::NotHandled,
      KeyCode::Char(c) => {
        let at = self.byte_offset(self.cursor);
        self.buffer.insert(at, c);
        self.cursor += 1;
        InputResult::Changed
      }
      _ => InputResult::NotHandled,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn ctrl_key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
  }

  fn typed(text: &str) -> TextInput {
    let mut input = TextInput::default();
    for c in text.chars() {
      input.handle_key(key(KeyCode::Char(c)));
    }
    input
  }

  #[test]
  fn test_typing_and_submit() {
    let mut input = typed("rust");
    assert_eq!(
      input.handle_key(key(KeyCode::Enter)),
      InputResult::Submitted("rust".to_string())
    );
  }

  #[test]
  fn test_cancel() {
    let mut input = typed("x");
    assert_eq!(input.handle_key(key(KeyCode::Esc)), InputResult::Cancelled);
  }

  #[test]
  fn test_multibyte_editing() {
    let mut input = typed("Café");
    input.handle_key(key(KeyCode::Backspace));
    assert_eq!(input.value(), "Caf");

    let mut input = typed("ac");
    input.handle_key(key(KeyCode::Left));
    input.handle_key(key(KeyCode::Char('é')));
    assert_eq!(input.value(), "aéc");
    assert_eq!(input.cursor_position(), 2);
  }

  #[test]
  fn test_ctrl_u_clears_before_cursor() {
    let mut input = typed("senior engineer");
    for _ in 0..8 {
      input.handle_key(key(KeyCode::Left));
    }
    input.handle_key(ctrl_key('u'));
    assert_eq!(input.value(), "engineer");
    assert_eq!(input.cursor_position(), 0);
  }

  #[test]
  fn test_ctrl_w_deletes_word() {
    let mut input = typed("python django ");
    input.handle_key(ctrl_key('w'));
    assert_eq!(input.value(), "python ");
    assert_eq!(input.cursor_position(), 7);
  }

  #[test]
  fn test_set_value_moves_cursor_to_end() {
    let mut input = TextInput::default();
    input.set_value("Nairobi");
    assert_eq!(input.cursor_position(), 7);
    input.handle_key(key(KeyCode::Char('!')));
    assert_eq!(input.value(), "Nairobi!");
  }

  #[test]
  fn test_terminal_cursor_counts_chars() {
    let mut input = TextInput::default();
    input.set_value("Café");
    input.handle_key(key(KeyCode::Left));

    let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(20, 1)).unwrap();
    terminal
      .draw(|frame| input.set_cursor(frame, frame.area(), "> "))
      .unwrap();
    assert_eq!(terminal.get_cursor_position().unwrap(), Position::new(5, 0));
  }

  #[test]
  fn test_terminal_cursor_clamped_to_area() {
    let mut input = TextInput::default();
    input.set_value("Murang'a county");

    let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(8, 1)).unwrap();
    terminal
      .draw(|frame| input.set_cursor(frame, frame.area(), ":"))
      .unwrap();
    assert_eq!(terminal.get_cursor_position().unwrap(), Position::new(7, 0));
  }
}
