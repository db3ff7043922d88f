use crate::query::{QueryState, QueryStatus};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// What a data panel should show instead of (or around) its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelStatus {
  /// First load, nothing to show yet
  Loading,
  /// Terminal error and no data to fall back on
  Failed(String),
  /// Successful fetch with zero items
  Empty,
  /// Render the data
  Ready,
}

/// Decide what a panel shows for `state`.
///
/// Data wins over errors: a failed background refetch keeps showing the last
/// good data.
pub fn panel_status<T>(state: &QueryState<T>, is_empty: impl Fn(&T) -> bool) -> PanelStatus {
  match (state.data(), state.error()) {
    (Some(data), _) if is_empty(data) => PanelStatus::Empty,
    (Some(_), _) => PanelStatus::Ready,
    (None, Some(error)) => PanelStatus::Failed(error.message().to_string()),
    (None, None) => PanelStatus::Loading,
  }
}

/// Bordered block titled with a fetching marker while a request is in flight
pub fn panel_block<T>(title: &str, state: &QueryState<T>) -> Block<'static> {
  let mut block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue))
    .title(format!(" {} ", title));

  let marker = match (state.is_fetching, state.status) {
    (true, _) => Some((" ⟳ ", Color::Yellow)),
    // Last good data kept after a failed refetch
    (false, QueryStatus::Error) if state.data.is_some() => Some((" stale ", Color::Red)),
    _ => None,
  };
  if let Some((text, color)) = marker {
    block = block.title(Line::from(Span::styled(text, Style::default().fg(color))).right_aligned());
  }
  block
}

/// Render a query-backed panel: spinner, error alert, empty message or content.
pub fn render_panel<T>(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  state: &QueryState<T>,
  empty_message: &str,
  is_empty: impl Fn(&T) -> bool,
  render: impl FnOnce(&mut Frame, Rect, &T),
) {
  let block = panel_block(title, state);
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let message = match panel_status(state, is_empty) {
    PanelStatus::Ready => {
      if let Some(data) = state.data() {
        render(frame, inner, data);
      }
      return;
    }
    PanelStatus::Loading => Paragraph::new("Loading...").style(Style::default().fg(Color::DarkGray)),
    PanelStatus::Empty => Paragraph::new(empty_message.to_string()).style(Style::default().fg(Color::DarkGray)),
    PanelStatus::Failed(error) => Paragraph::new(vec![
      Line::from(Span::styled("Failed to load", Style::default().fg(Color::Red).bold())),
      Line::from(Span::styled(error, Style::default().fg(Color::Red))),
      Line::from(Span::styled("Press 'r' to retry.", Style::default().fg(Color::DarkGray))),
    ])
    .wrap(Wrap { trim: true }),
  };
  frame.render_widget(message, inner);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::QueryError;
  use std::sync::Arc;

  fn state(data: Option<Vec<u32>>, error: Option<&str>) -> QueryState<Vec<u32>> {
    QueryState {
      status: if error.is_some() {
        QueryStatus::Error
      } else if data.is_some() {
        QueryStatus::Success
      } else {
        QueryStatus::Loading
      },
      data: data.map(Arc::new),
      error: error.map(QueryError::other),
      is_fetching: false,
      fetched_at: None,
    }
  }

  #[test]
  fn test_loading_without_data() {
    assert_eq!(panel_status(&state(None, None), Vec::is_empty), PanelStatus::Loading);
  }

  #[test]
  fn test_empty_result_is_not_an_error() {
    assert_eq!(
      panel_status(&state(Some(vec![]), None), Vec::is_empty),
      PanelStatus::Empty
    );
  }

  #[test]
  fn test_error_without_data_fails() {
    assert_eq!(
      panel_status(&state(None, Some("timed out")), Vec::is_empty),
      PanelStatus::Failed("timed out".into())
    );
  }

  #[test]
  fn test_error_with_data_keeps_data() {
    assert_eq!(
      panel_status(&state(Some(vec![1]), Some("timed out")), Vec::is_empty),
      PanelStatus::Ready
    );
  }

  fn top_border(block: Block<'static>) -> String {
    let area = Rect::new(0, 0, 30, 3);
    let mut buf = Buffer::empty(area);
    block.render(area, &mut buf);
    (0..area.width).map(|x| buf[(x, 0)].symbol().to_string()).collect()
  }

  #[test]
  fn test_block_marks_stale_data_after_failure() {
    let failed = state(Some(vec![1]), Some("timed out"));
    assert!(top_border(panel_block("Skills", &failed)).contains("stale"));

    let mut refetching = failed.clone();
    refetching.is_fetching = true;
    let title = top_border(panel_block("Skills", &refetching));
    assert!(title.contains("⟳"));
    assert!(!title.contains("stale"));

    let fresh = state(Some(vec![1]), None);
    assert!(!top_border(panel_block("Skills", &fresh)).contains("stale"));
  }
}
