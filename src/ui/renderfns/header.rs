use crate::ui::view::ShortcutInfo;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use url::Url;

/// Draw the header bar: name, API host, fetch indicator and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  api_url: &Url,
  fetching: bool,
  shortcuts: &[ShortcutInfo],
) {
  let separator = || Span::styled("│", Style::default().fg(Color::DarkGray));

  let mut spans = vec![
    Span::styled(" jobpulse ", Style::default().fg(Color::Cyan).bold()),
    separator(),
    Span::styled(format!(" {} ", api_host(api_url)), Style::default().fg(Color::White)),
    separator(),
  ];

  if fetching {
    spans.push(Span::styled(" fetching… ", Style::default().fg(Color::Yellow)));
  } else {
    spans.push(Span::raw(" "));
  }
  spans.push(Span::raw(" "));

  let mut shortcuts = shortcuts.to_vec();
  shortcuts.sort_by_key(|s| s.priority);
  for (i, shortcut) in shortcuts.iter().enumerate() {
    if i > 0 {
      spans.push(Span::raw("   "));
    }
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// "host:port" of the API, without scheme or path
pub fn api_host(url: &Url) -> String {
  match (url.host_str(), url.port()) {
    (Some(host), Some(port)) => format!("{}:{}", host, port),
    (Some(host), None) => host.to_string(),
    _ => url.as_str().to_string(),
  }
}
