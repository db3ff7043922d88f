use crate::api::{JobPosting, JobSource, JobsQuery, Paginated, SearchFilters};
use crate::app::AppContext;
use crate::filters::{FilterChange, FilterController};
use crate::format::{format_relative_time, format_salary};
use crate::query::{QueryClient, QueryError, QueryKey, QueryObserver};
use crate::ui::components::{
  panel_block, panel_status, FilterField, FilterFieldPicker, FilterPickerEvent, KeyResult, Pagination,
  PanelStatus, PromptEvent, PromptInput,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{remote_type_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::JobDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState, Paragraph, Wrap};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const JOBS_STALE_TIME: Duration = Duration::from_secs(2 * 60);
const JOBS_QUERY: &str = "jobs";

type JobPage = Paginated<JobPosting>;

/// Paginated, filterable list of job postings
pub struct JobListView {
  source: Arc<dyn JobSource>,
  queries: QueryClient,
  filters: FilterController,
  pagination: Pagination,
  jobs: QueryObserver<JobPage>,
  /// Last page shown, kept on screen while the next one loads
  previous: Option<Arc<JobPage>>,
  list_state: ListState,
  search: PromptInput,
  picker: FilterFieldPicker,
  field_prompt: PromptInput,
  editing: Option<FilterField>,
  input_error: Option<String>,
}

impl JobListView {
  pub fn new(source: Arc<dyn JobSource>, queries: QueryClient, page_size: u32, debounce: Duration) -> Self {
    let filters = FilterController::new(debounce);
    let pagination = Pagination::new(page_size);
    let jobs = jobs_query(&queries, &source, params(filters.filters(), &pagination));

    Self {
      source,
      queries,
      filters,
      pagination,
      jobs,
      previous: None,
      list_state: ListState::default(),
      search: PromptInput::new("/"),
      picker: FilterFieldPicker::new(),
      field_prompt: PromptInput::new("> "),
      editing: None,
      input_error: None,
    }
  }

  pub fn from_context(ctx: &AppContext) -> Self {
    Self::new(
      Arc::new(ctx.api.clone()),
      ctx.queries.clone(),
      ctx.config.jobs.page_size,
      ctx.config.debounce_delay(),
    )
  }

  /// The page on screen: the current one, or the previous while it loads
  fn displayed(&self) -> Option<&JobPage> {
    self.jobs.data().or(self.previous.as_deref())
  }

  fn jobs(&self) -> &[JobPosting] {
    self.displayed().map(|page| page.results.as_slice()).unwrap_or(&[])
  }

  /// Point the observer at the current filters and page
  fn resubscribe(&mut self) {
    if let Some(data) = self.jobs.state().data.clone() {
      self.previous = Some(data);
    }
    let params = params(self.filters.filters(), &self.pagination);
    debug!(page = params.page, filters = params.filters.active_count(), "Loading job page");
    self.jobs = jobs_query(&self.queries, &self.source, params);
  }

  fn change_page(&mut self, forward: bool) {
    let moved = if forward {
      self.pagination.next()
    } else {
      self.pagination.previous()
    };
    if moved {
      self.list_state.select(Some(0));
      self.resubscribe();
    }
  }

  fn apply_change(&mut self, change: FilterChange) {
    self.input_error = None;
    self.filters.on_filter_change(change);
  }

  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.search.handle_key(key) {
      KeyResult::Event(PromptEvent::Changed(text)) => {
        self.apply_change(FilterChange::Search(text));
        return Some(ViewAction::None);
      }
      KeyResult::Event(PromptEvent::Submitted(_)) => return Some(ViewAction::None),
      KeyResult::Event(PromptEvent::Cancelled) => {
        self.apply_change(FilterChange::Search(String::new()));
        return Some(ViewAction::None);
      }
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    match self.picker.handle_key(key) {
      KeyResult::Event(FilterPickerEvent::Changed(change)) => {
        self.apply_change(change);
        return Some(ViewAction::None);
      }
      KeyResult::Event(FilterPickerEvent::EditText(field)) => {
        self.editing = Some(field);
        let current = field.current_text(self.filters.filters());
        self.field_prompt.activate(field.label(), &current);
        return Some(ViewAction::None);
      }
      KeyResult::Event(FilterPickerEvent::Cancelled) | KeyResult::Handled => {
        return Some(ViewAction::None)
      }
      KeyResult::NotHandled => {}
    }

    match self.field_prompt.handle_key(key) {
      KeyResult::Event(PromptEvent::Submitted(text)) => {
        if let Some(field) = self.editing.take() {
          match field.parse_text(&text) {
            Ok(change) => self.apply_change(change),
            Err(message) => self.input_error = Some(message),
          }
        }
        Some(ViewAction::None)
      }
      KeyResult::Event(PromptEvent::Cancelled) => {
        self.editing = None;
        Some(ViewAction::None)
      }
      KeyResult::Event(PromptEvent::Changed(_)) | KeyResult::Handled => Some(ViewAction::None),
      KeyResult::NotHandled => None,
    }
  }

  fn render_filter_bar(&self, frame: &mut Frame, area: Rect) {
    let filters = self.filters.filters();
    let mut spans = vec![Span::styled(
      format!(" {} ", self.pagination.label()),
      Style::default().fg(Color::Cyan),
    )];
    if let Some(page) = self.displayed() {
      spans.push(Span::styled(
        format!("│ {} jobs ", page.count),
        Style::default().fg(Color::DarkGray),
      ));
    }

    let active = filters.active_count();
    if active > 0 {
      spans.push(Span::styled(
        format!("│ {} filter{} active: ", active, if active == 1 { "" } else { "s" }),
        Style::default().fg(Color::Yellow),
      ));
      spans.push(Span::raw(describe_filters(filters)));
    }
    if self.filters.is_pending() {
      spans.push(Span::styled(" …", Style::default().fg(Color::DarkGray)));
    }
    if let Some(error) = &self.input_error {
      spans.push(Span::styled(format!("  {}", error), Style::default().fg(Color::Red)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let block = panel_block("Jobs", self.jobs.state());

    if self.displayed().is_none() || self.jobs().is_empty() {
      let status = match self.displayed() {
        Some(page) if page.is_empty() => PanelStatus::Empty,
        Some(_) => PanelStatus::Ready,
        None => panel_status(self.jobs.state(), JobPage::is_empty),
      };
      let (text, color) = match status {
        PanelStatus::Loading => ("Loading jobs...".to_string(), Color::DarkGray),
        PanelStatus::Failed(e) => (format!("Failed to load jobs: {}\n\nPress 'r' to retry.", e), Color::Red),
        _ if self.filters.filters().is_empty() => ("No jobs found.".to_string(), Color::DarkGray),
        _ => (
          "No jobs match these filters. Press 'c' to clear them.".to_string(),
          Color::DarkGray,
        ),
      };
      let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: true });
      frame.render_widget(paragraph, area);
      return;
    }

    let now = chrono::Utc::now();
    let items: Vec<ListItem> = self
      .jobs()
      .iter()
      .map(|job| {
        ListItem::new(vec![
          Line::from(vec![
            Span::styled(truncate(&job.title, 48), Style::default().fg(Color::White).bold()),
            Span::raw("  "),
            Span::styled(truncate(&job.company.name, 28), Style::default().fg(Color::Cyan)),
          ]),
          Line::from(vec![
            Span::styled(
              format!("  {:<10}", job.remote_type.label()),
              Style::default().fg(remote_type_color(job.remote_type)),
            ),
            Span::styled(format!("{:<20}", truncate(&job.location, 20)), Style::default()),
            Span::styled(
              format!("{:<30}", format_salary(job.salary_min, job.salary_max, &job.salary_currency)),
              Style::default().fg(Color::Green),
            ),
            Span::styled(
              format_relative_time(&job.posted_date, now),
              Style::default().fg(Color::DarkGray),
            ),
          ]),
        ])
      })
      .collect();

    ensure_valid_selection(&mut self.list_state, items.len());
    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
      .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

fn params(filters: &SearchFilters, pagination: &Pagination) -> JobsQuery {
  JobsQuery {
    filters: filters.clone(),
    page: pagination.page(),
    page_size: pagination.page_size(),
  }
}

fn jobs_query(queries: &QueryClient, source: &Arc<dyn JobSource>, params: JobsQuery) -> QueryObserver<JobPage> {
  let source = source.clone();
  let key = QueryKey::with_params(JOBS_QUERY, &params);
  queries.subscribe(
    key,
    move || {
      let fut = source.jobs(params.clone());
      async move { fut.await.map_err(QueryError::from) }
    },
    queries.default_options().with_stale_time(JOBS_STALE_TIME),
  )
}

fn describe_filters(filters: &SearchFilters) -> String {
  let mut parts = Vec::new();
  if let Some(search) = &filters.search {
    parts.push(format!("\"{}\"", search));
  }
  for (field, value) in [
    ("location", filters.location.as_deref()),
    ("county", filters.county.as_deref()),
    ("skills", filters.skills.as_deref()),
    ("type", filters.employment_type.map(|v| v.label())),
    ("level", filters.experience_level.map(|v| v.label())),
    ("work", filters.remote_type.map(|v| v.label())),
  ] {
    if let Some(value) = value {
      parts.push(format!("{}={}", field, value));
    }
  }
  if let Some(min) = filters.min_salary {
    parts.push(format!("min={}", min));
  }
  if let Some(max) = filters.max_salary {
    parts.push(format!("max={}", max));
  }
  parts.join(" ")
}

impl View for JobListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(action) = self.handle_overlays(key) {
      return action;
    }

    match key.code {
      KeyCode::Char('/') => {
        let current = self.filters.filters().search.clone().unwrap_or_default();
        self.search.activate("Search", &current);
      }
      KeyCode::Char('f') => self.picker.show(),
      KeyCode::Char('c') => {
        self.input_error = None;
        self.filters.clear();
      }
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('n') | KeyCode::Right => self.change_page(true),
      KeyCode::Char('p') | KeyCode::Left => self.change_page(false),
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Enter => {
        let selected = self.list_state.selected().and_then(|idx| self.jobs().get(idx));
        if let Some(job) = selected {
          return ViewAction::Push(Box::new(JobDetailView::new(
            self.source.clone(),
            self.queries.clone(),
            job.id.clone(),
            job.title.clone(),
          )));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let [bar_area, list_area] =
      Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(area);
    self.render_filter_bar(frame, bar_area);
    self.render_list(frame, list_area);

    self.search.render_overlay(frame, list_area);
    self.picker.render_overlay(frame, list_area);
    self.field_prompt.render_overlay(frame, list_area);
  }

  fn breadcrumb_label(&self) -> String {
    format!("Jobs ({})", self.pagination.label())
  }

  fn tick(&mut self) -> bool {
    let mut changed = false;

    // Every propagated filter set starts over at page 1
    if self.filters.poll_propagated().is_some() {
      self.pagination.reset();
      self.list_state.select(Some(0));
      self.resubscribe();
      changed = true;
    }

    if self.jobs.poll() {
      changed = true;
    }
    if let Some(count) = self.jobs.data().map(|page| page.count) {
      self.pagination.set_total(count);
      self.previous = None;
    }
    changed
  }

  fn is_capturing_input(&self) -> bool {
    self.search.is_active() || self.picker.is_active() || self.field_prompt.is_active()
  }

  fn is_fetching(&self) -> bool {
    self.jobs.is_fetching()
  }

  /// Refetch this page and mark every other cached page stale
  fn refresh(&mut self) {
    self.queries.invalidate_matching(JOBS_QUERY);
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("f", "filter").with_priority(25),
      ShortcutInfo::new("c", "clear").with_priority(30),
      ShortcutInfo::new("n/p", "page").with_priority(35),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::error::ApiError;
  use crate::api::{ApiResult, Company, EmploymentType, ExperienceLevel, RemoteType};
  use crate::query::QueryOptions;
  use crossterm::event::KeyModifiers;
  use futures::future::BoxFuture;
  use std::sync::Mutex;

  /// Serves 45 postings, recording every request
  struct Fixture {
    total: u64,
    latency: Duration,
    requests: Mutex<Vec<JobsQuery>>,
  }

  impl Fixture {
    fn new(latency: Duration) -> Arc<Self> {
      Arc::new(Self {
        total: 45,
        latency,
        requests: Mutex::new(Vec::new()),
      })
    }

    fn requests(&self) -> Vec<JobsQuery> {
      self.requests.lock().unwrap().clone()
    }
  }

  fn posting(n: u64) -> JobPosting {
    JobPosting {
      id: format!("job-{}", n),
      title: format!("Engineer {}", n),
      company: Company {
        id: 1,
        name: "Acme".into(),
        industry: "Technology".into(),
        size: String::new(),
        location: "Nairobi".into(),
        website: String::new(),
        logo_url: String::new(),
        job_count: None,
      },
      description: String::new(),
      requirements: String::new(),
      location: "Nairobi".into(),
      county: "Nairobi".into(),
      remote_type: RemoteType::Remote,
      employment_type: EmploymentType::FullTime,
      experience_level: ExperienceLevel::Mid,
      salary_min: None,
      salary_max: None,
      salary_currency: "KES".into(),
      skills_required: vec![],
      technologies: vec![],
      source_platform: "fixture".into(),
      source_url: String::new(),
      posted_date: "2024-03-05".into(),
      scraped_at: String::new(),
      is_active: true,
      view_count: 0,
    }
  }

  impl JobSource for Fixture {
    fn jobs(&self, query: JobsQuery) -> BoxFuture<'static, ApiResult<JobPage>> {
      self.requests.lock().unwrap().push(query.clone());
      let total = self.total;
      let latency = self.latency;
      Box::pin(async move {
        tokio::time::sleep(latency).await;
        let start = u64::from((query.page - 1) * query.page_size);
        let end = (start + u64::from(query.page_size)).min(total);
        Ok(Paginated {
          count: total,
          next: None,
          previous: None,
          results: (start..end).map(posting).collect(),
        })
      })
    }

    fn job(&self, id: String) -> BoxFuture<'static, ApiResult<JobPosting>> {
      Box::pin(async move {
        Err(ApiError::HttpStatus {
          url: format!("/jobs/{}/", id),
          status: 404,
          body: String::new(),
        })
      })
    }
  }

  fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
  }

  fn view(fixture: &Arc<Fixture>) -> JobListView {
    let queries = QueryClient::new(QueryOptions::default().with_retry(0));
    JobListView::new(fixture.clone(), queries, 20, Duration::from_millis(500))
  }

  /// Tick until the current page has loaded
  async fn settle(view: &mut JobListView) {
    for _ in 0..100 {
      tokio::time::sleep(Duration::from_millis(10)).await;
      view.tick();
      if view.jobs.data().is_some() && !view.jobs.is_fetching() {
        return;
      }
    }
    panic!("job page never loaded");
  }

  #[tokio::test(start_paused = true)]
  async fn test_total_pages_from_count() {
    let fixture = Fixture::new(Duration::from_millis(20));
    let mut view = view(&fixture);
    settle(&mut view).await;

    assert_eq!(view.pagination.total_pages(), Some(3));
    assert_eq!(view.jobs().len(), 20);
    assert_eq!(view.pagination.label(), "Page 1 of 3");
  }

  #[tokio::test(start_paused = true)]
  async fn test_previous_page_stays_visible_while_loading() {
    let fixture = Fixture::new(Duration::from_millis(100));
    let mut view = view(&fixture);
    settle(&mut view).await;

    view.handle_key(key('n'));
    assert_eq!(view.pagination.page(), 2);
    assert!(view.jobs.data().is_none());
    assert_eq!(view.jobs()[0].id, "job-0");

    settle(&mut view).await;
    assert_eq!(view.jobs()[0].id, "job-20");
  }

  #[tokio::test(start_paused = true)]
  async fn test_filter_change_resets_page() {
    let fixture = Fixture::new(Duration::from_millis(20));
    let mut view = view(&fixture);
    settle(&mut view).await;

    view.handle_key(key('n'));
    settle(&mut view).await;
    view.handle_key(key('n'));
    settle(&mut view).await;
    assert_eq!(view.pagination.page(), 3);
    assert_eq!(view.jobs().len(), 5);

    // Type a search; nothing is sent until the debounce settles
    view.handle_key(key('/'));
    for c in "rust".chars() {
      view.handle_key(key(c));
    }
    let sent = fixture.requests().len();
    tokio::time::sleep(Duration::from_millis(100)).await;
    view.tick();
    assert_eq!(fixture.requests().len(), sent);
    assert_eq!(view.pagination.page(), 3);

    tokio::time::sleep(Duration::from_millis(500)).await;
    view.tick();
    assert_eq!(view.pagination.page(), 1);
    settle(&mut view).await;

    let last = fixture.requests().last().cloned().unwrap();
    assert_eq!(last.page, 1);
    assert_eq!(last.filters.search.as_deref(), Some("rust"));
    // One request for the whole burst of keystrokes
    assert_eq!(fixture.requests().len(), sent + 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_clear_resets_page_immediately() {
    let fixture = Fixture::new(Duration::from_millis(20));
    let mut view = view(&fixture);
    settle(&mut view).await;

    view.handle_key(key('n'));
    settle(&mut view).await;
    assert_eq!(view.pagination.page(), 2);

    view.handle_key(key('c'));
    view.tick();
    assert_eq!(view.pagination.page(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_filters_shared_cache_entry() {
    let fixture = Fixture::new(Duration::from_millis(20));
    let mut first = view(&fixture);
    settle(&mut first).await;

    // Second view on the same client reuses the fresh page
    let second = JobListView::new(fixture.clone(), first.queries.clone(), 20, Duration::from_millis(500));
    assert_eq!(fixture.requests().len(), 1);
    assert_eq!(second.jobs().len(), 20);
  }

  #[tokio::test(start_paused = true)]
  async fn test_refresh_marks_other_pages_stale() {
    let fixture = Fixture::new(Duration::from_millis(20));
    let mut view = view(&fixture);
    settle(&mut view).await;
    view.handle_key(key('n'));
    settle(&mut view).await;
    view.handle_key(key('p'));
    settle(&mut view).await;
    // Page 1 was still fresh
    assert_eq!(fixture.requests().len(), 2);

    view.handle_key(key('r'));
    settle(&mut view).await;
    assert_eq!(fixture.requests().len(), 3);

    view.handle_key(key('n'));
    settle(&mut view).await;
    assert_eq!(fixture.requests().len(), 4);
    assert_eq!(fixture.requests().last().map(|q| q.page), Some(2));
  }

  #[test]
  fn test_describe_filters() {
    let filters = SearchFilters {
      search: Some("data".into()),
      remote_type: Some(RemoteType::Hybrid),
      min_salary: Some(50000),
      ..Default::default()
    };
    assert_eq!(describe_filters(&filters), "\"data\" work=Hybrid min=50000");
  }
}
