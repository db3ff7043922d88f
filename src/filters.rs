//! Job search filters with debounced propagation.

use std::time::Duration;

use crate::api::{EmploymentType, ExperienceLevel, RemoteType, SearchFilters};
use crate::debounce::Debouncer;

/// A partial update to [`SearchFilters`].
///
/// Text values that are empty after trimming clear the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
  Search(String),
  Location(String),
  County(String),
  Skills(String),
  EmploymentType(Option<EmploymentType>),
  ExperienceLevel(Option<ExperienceLevel>),
  RemoteType(Option<RemoteType>),
  MinSalary(Option<u64>),
  MaxSalary(Option<u64>),
}

impl FilterChange {
  fn apply(self, filters: &mut SearchFilters) {
    match self {
      FilterChange::Search(v) => filters.search = non_empty(v),
      FilterChange::Location(v) => filters.location = non_empty(v),
      FilterChange::County(v) => filters.county = non_empty(v),
      FilterChange::Skills(v) => filters.skills = non_empty(v),
      FilterChange::EmploymentType(v) => filters.employment_type = v,
      FilterChange::ExperienceLevel(v) => filters.experience_level = v,
      FilterChange::RemoteType(v) => filters.remote_type = v,
      FilterChange::MinSalary(v) => filters.min_salary = v,
      FilterChange::MaxSalary(v) => filters.max_salary = v,
    }
  }
}

fn non_empty(value: String) -> Option<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    None
  } else {
    Some(trimmed.to_string())
  }
}

/// Owns the filter set shown in the UI and decides when it reaches the query.
///
/// Edits are merged right away so the UI always shows what was typed, but the
/// merged set is only handed on after a quiet period.
pub struct FilterController {
  filters: SearchFilters,
  debouncer: Debouncer<SearchFilters>,
}

impl FilterController {
  pub fn new(delay: Duration) -> Self {
    Self {
      filters: SearchFilters::default(),
      debouncer: Debouncer::new(delay),
    }
  }

  pub fn filters(&self) -> &SearchFilters {
    &self.filters
  }

  pub fn on_filter_change(&mut self, change: FilterChange) {
    change.apply(&mut self.filters);
    self.debouncer.call(self.filters.clone());
  }

  /// Reset every filter and propagate without waiting.
  pub fn clear(&mut self) {
    self.filters = SearchFilters::default();
    self.debouncer.flush(self.filters.clone());
  }

  /// Whether an edit is waiting for the quiet period to end
  pub fn is_pending(&self) -> bool {
    self.debouncer.is_pending()
  }

  /// The most recent propagated filter set since the last poll.
  pub fn poll_propagated(&mut self) -> Option<SearchFilters> {
    let mut latest = None;
    while let Some(filters) = self.debouncer.poll() {
      latest = Some(filters);
    }
    latest
  }
}
