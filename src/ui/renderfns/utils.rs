use crate::api::{ExperienceLevel, RemoteType};
use ratatui::prelude::Color;

/// Truncate a string to at most `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

pub fn remote_type_color(remote_type: RemoteType) -> Color {
  match remote_type {
    RemoteType::Remote => Color::Green,
    RemoteType::Hybrid => Color::Yellow,
    RemoteType::OnSite => Color::White,
  }
}

pub fn experience_color(level: ExperienceLevel) -> Color {
  match level {
    ExperienceLevel::Entry => Color::Cyan,
    ExperienceLevel::Mid => Color::Blue,
    ExperienceLevel::Senior => Color::Magenta,
    ExperienceLevel::Executive => Color::Red,
  }
}

/// Horizontal bar of `width` cells proportional to `value / max`
pub fn bar(value: f64, max: f64, width: usize) -> String {
  if width == 0 || max <= 0.0 || value <= 0.0 {
    return String::new();
  }
  let cells = ((value / max) * width as f64).round() as usize;
  "█".repeat(cells.clamp(1, width))
}
