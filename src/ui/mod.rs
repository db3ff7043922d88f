pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::ListState;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let [header, content, footer] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(1),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  let (fetching, shortcuts) = app
    .current_view()
    .map(|view| (view.is_fetching(), view.shortcuts()))
    .unwrap_or_default();
  let api_url = app.context().api.base_url().clone();
  renderfns::draw_header(frame, header, &api_url, fetching, &shortcuts);

  if let Some(view) = app.current_view_mut() {
    view.render(frame, content);
  }
  if app.command_input().is_active() {
    app.command_input().render_overlay(frame, content);
  }

  let breadcrumb = app.breadcrumb();
  renderfns::draw_footer(frame, footer, &breadcrumb, app.status());
}

/// Keep the selection inside `0..len`, selecting the first row if none is
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match (state.selected(), len) {
    (_, 0) => state.select(None),
    (None, _) => state.select(Some(0)),
    (Some(i), len) if i >= len => state.select(Some(len - 1)),
    _ => {}
  }
}
