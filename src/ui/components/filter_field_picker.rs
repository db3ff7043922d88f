use super::KeyResult;
use crate::api::{EmploymentType, ExperienceLevel, RemoteType, SearchFilters};
use crate::filters::FilterChange;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

/// Job filter that can be edited from the picker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
  Location,
  County,
  Skills,
  EmploymentType,
  ExperienceLevel,
  RemoteType,
  MinSalary,
  MaxSalary,
}

impl FilterField {
  pub const ALL: &'static [FilterField] = &[
    FilterField::Location,
    FilterField::County,
    FilterField::Skills,
    FilterField::EmploymentType,
    FilterField::ExperienceLevel,
    FilterField::RemoteType,
    FilterField::MinSalary,
    FilterField::MaxSalary,
  ];

  pub fn label(&self) -> &'static str {
    match self {
      FilterField::Location => "Location",
      FilterField::County => "County",
      FilterField::Skills => "Skills (comma separated)",
      FilterField::EmploymentType => "Employment type",
      FilterField::ExperienceLevel => "Experience level",
      FilterField::RemoteType => "Work arrangement",
      FilterField::MinSalary => "Minimum salary",
      FilterField::MaxSalary => "Maximum salary",
    }
  }

  /// Fixed choices for enum fields, `None` for free-text fields.
  ///
  /// The first choice always clears the field.
  pub fn choices(&self) -> Option<Vec<(&'static str, FilterChange)>> {
    let any = "Any";
    match self {
      FilterField::EmploymentType => Some(
        std::iter::once((any, FilterChange::EmploymentType(None)))
          .chain(
            EmploymentType::ALL
              .iter()
              .map(|v| (v.label(), FilterChange::EmploymentType(Some(*v)))),
          )
          .collect(),
      ),
      FilterField::ExperienceLevel => Some(
        std::iter::once((any, FilterChange::ExperienceLevel(None)))
          .chain(
            ExperienceLevel::ALL
              .iter()
              .map(|v| (v.label(), FilterChange::ExperienceLevel(Some(*v)))),
          )
          .collect(),
      ),
      FilterField::RemoteType => Some(
        std::iter::once((any, FilterChange::RemoteType(None)))
          .chain(
            RemoteType::ALL
              .iter()
              .map(|v| (v.label(), FilterChange::RemoteType(Some(*v)))),
          )
          .collect(),
      ),
      _ => None,
    }
  }

  /// Current value as text, for pre-filling the prompt
  pub fn current_text(&self, filters: &SearchFilters) -> String {
    match self {
      FilterField::Location => filters.location.clone().unwrap_or_default(),
      FilterField::County => filters.county.clone().unwrap_or_default(),
      FilterField::Skills => filters.skills.clone().unwrap_or_default(),
      FilterField::MinSalary => filters.min_salary.map(|v| v.to_string()).unwrap_or_default(),
      FilterField::MaxSalary => filters.max_salary.map(|v| v.to_string()).unwrap_or_default(),
      FilterField::EmploymentType => filters
        .employment_type
        .map(|v| v.label().to_string())
        .unwrap_or_default(),
      FilterField::ExperienceLevel => filters
        .experience_level
        .map(|v| v.label().to_string())
        .unwrap_or_default(),
      FilterField::RemoteType => filters
        .remote_type
        .map(|v| v.label().to_string())
        .unwrap_or_default(),
    }
  }

  /// Turn prompt text into a filter change for a free-text field.
  pub fn parse_text(&self, text: &str) -> Result<FilterChange, String> {
    let text = text.trim().to_string();
    match self {
      FilterField::Location => Ok(FilterChange::Location(text)),
      FilterField::County => Ok(FilterChange::County(text)),
      FilterField::Skills => Ok(FilterChange::Skills(text)),
      FilterField::MinSalary => parse_amount(&text).map(FilterChange::MinSalary),
      FilterField::MaxSalary => parse_amount(&text).map(FilterChange::MaxSalary),
      FilterField::EmploymentType | FilterField::ExperienceLevel | FilterField::RemoteType => {
        Err(format!("{} is chosen from a list", self.label()))
      }
    }
  }
}

/// "150000", "150,000" or "150k". Empty clears.
fn parse_amount(text: &str) -> Result<Option<u64>, String> {
  let cleaned: String = text.chars().filter(|c| *c != ',' && *c != '_').collect();
  if cleaned.is_empty() {
    return Ok(None);
  }
  let (digits, multiplier) = match cleaned.strip_suffix(['k', 'K']) {
    Some(rest) => (rest, 1_000),
    None => (cleaned.as_str(), 1),
  };
  digits
    .parse::<u64>()
    .map(|v| Some(v * multiplier))
    .map_err(|_| format!("Not an amount: {}", text))
}

/// Events emitted by the picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPickerEvent {
  /// A choice field got a new value
  Changed(FilterChange),
  /// A free-text field was picked; the parent should prompt for its value
  EditText(FilterField),
  Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Stage {
  #[default]
  Closed,
  Fields,
  Choices(FilterField),
}

/// Overlay for picking a filter field, then a value for enum fields
#[derive(Debug, Clone, Default)]
pub struct FilterFieldPicker {
  stage: Stage,
  selected: usize,
}

impl FilterFieldPicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.stage != Stage::Closed
  }

  pub fn show(&mut self) {
    self.stage = Stage::Fields;
    self.selected = 0;
  }

  pub fn hide(&mut self) {
    self.stage = Stage::Closed;
    self.selected = 0;
  }

  fn labels(&self) -> Vec<&'static str> {
    match self.stage {
      Stage::Closed => Vec::new(),
      Stage::Fields => FilterField::ALL.iter().map(|f| f.label()).collect(),
      Stage::Choices(field) => field
        .choices()
        .unwrap_or_default()
        .into_iter()
        .map(|(label, _)| label)
        .collect(),
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FilterPickerEvent> {
    if !self.is_active() {
      return KeyResult::NotHandled;
    }

    let len = self.labels().len();
    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(FilterPickerEvent::Cancelled)
      }
      KeyCode::Char('j') | KeyCode::Down if len > 0 => {
        self.selected = (self.selected + 1) % len;
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up if len > 0 => {
        self.selected = (self.selected + len - 1) % len;
        KeyResult::Handled
      }
      KeyCode::Enter => self.select(),
      _ => KeyResult::Handled,
    }
  }

  fn select(&mut self) -> KeyResult<FilterPickerEvent> {
    match self.stage {
      Stage::Closed => KeyResult::NotHandled,
      Stage::Fields => {
        let Some(&field) = FilterField::ALL.get(self.selected) else {
          self.hide();
          return KeyResult::Event(FilterPickerEvent::Cancelled);
        };
        if field.choices().is_some() {
          self.stage = Stage::Choices(field);
          self.selected = 0;
          KeyResult::Handled
        } else {
          self.hide();
          KeyResult::Event(FilterPickerEvent::EditText(field))
        }
      }
      Stage::Choices(field) => {
        let change = field
          .choices()
          .and_then(|choices| choices.into_iter().nth(self.selected))
          .map(|(_, change)| change);
        self.hide();
        match change {
          Some(change) => KeyResult::Event(FilterPickerEvent::Changed(change)),
          None => KeyResult::Event(FilterPickerEvent::Cancelled),
        }
      }
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let title = match self.stage {
      Stage::Closed => return,
      Stage::Fields => " Filter By ".to_string(),
      Stage::Choices(field) => format!(" {} ", field.label()),
    };
    let labels = self.labels();

    let longest = labels.iter().map(|l| l.len()).max().unwrap_or(10) as u16;
    let width = (longest + 6).max(title.len() as u16 + 2).min(area.width);
    let height = (labels.len() as u16 + 2).min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(title);
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);
    if inner.height == 0 {
      return;
    }

    let items: Vec<ListItem> = labels
      .into_iter()
      .map(|label| ListItem::new(Span::styled(label, Style::default().fg(Color::Cyan))))
      .collect();
    let list = List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let mut state = ListState::default().with_selected(Some(self.selected));
    frame.render_stateful_widget(list, inner, &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_text_field_asks_parent_to_prompt() {
    let mut picker = FilterFieldPicker::new();
    picker.show();
    // Location is first
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FilterPickerEvent::EditText(FilterField::Location))
    );
    assert!(!picker.is_active());
  }

  #[test]
  fn test_choice_field_opens_values() {
    let mut picker = FilterFieldPicker::new();
    picker.show();
    for _ in 0..5 {
      picker.handle_key(key(KeyCode::Down));
    }
    // RemoteType: Any, On-site, Remote, Hybrid
    assert_eq!(picker.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    picker.handle_key(key(KeyCode::Down));
    picker.handle_key(key(KeyCode::Down));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FilterPickerEvent::Changed(FilterChange::RemoteType(Some(
        RemoteType::Remote
      ))))
    );
  }

  #[test]
  fn test_up_wraps_around() {
    let mut picker = FilterFieldPicker::new();
    picker.show();
    picker.handle_key(key(KeyCode::Up));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FilterPickerEvent::EditText(FilterField::MaxSalary))
    );
  }

  #[test]
  fn test_parse_salary_text() {
    assert_eq!(
      FilterField::MinSalary.parse_text("150,000"),
      Ok(FilterChange::MinSalary(Some(150000)))
    );
    assert_eq!(
      FilterField::MaxSalary.parse_text("200k"),
      Ok(FilterChange::MaxSalary(Some(200000)))
    );
    assert_eq!(FilterField::MinSalary.parse_text(""), Ok(FilterChange::MinSalary(None)));
    assert!(FilterField::MinSalary.parse_text("lots").is_err());
  }

  #[test]
  fn test_current_text() {
    let filters = SearchFilters {
      remote_type: Some(RemoteType::Hybrid),
      min_salary: Some(90000),
      ..Default::default()
    };
    assert_eq!(FilterField::RemoteType.current_text(&filters), "Hybrid");
    assert_eq!(FilterField::MinSalary.current_text(&filters), "90000");
    assert_eq!(FilterField::County.current_text(&filters), "");
  }
}
