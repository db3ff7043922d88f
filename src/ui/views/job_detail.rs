use crate::api::{JobPosting, JobSource};
use crate::format::{format_date, format_salary};
use crate::query::{QueryClient, QueryError, QueryKey, QueryObserver};
use crate::ui::components::render_panel;
use crate::ui::renderfns::{experience_color, remote_type_color};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};
use std::sync::Arc;

/// A single job posting
pub struct JobDetailView {
  title: String,
  queries: QueryClient,
  job: QueryObserver<JobPosting>,
  scroll: u16,
}

impl JobDetailView {
  pub fn new(source: Arc<dyn JobSource>, queries: QueryClient, id: String, title: String) -> Self {
    let key = QueryKey::with_params("job", &id);
    // A blank id would hit the list endpoint instead of a posting
    let options = queries.default_options().enabled(!id.trim().is_empty());
    let job = queries.subscribe(
      key,
      move || {
        let fut = source.job(id.clone());
        async move { fut.await.map_err(QueryError::from) }
      },
      options,
    );

    Self {
      title,
      queries,
      job,
      scroll: 0,
    }
  }
}

fn detail_lines(job: &JobPosting) -> Vec<Line<'static>> {
  let label = Style::default().fg(Color::DarkGray);
  let field = |name: &'static str, value: String| {
    Line::from(vec![Span::styled(format!("{:<12}", name), label), Span::raw(value)])
  };

  let mut lines = vec![
    Line::from(Span::styled(job.title.clone(), Style::default().fg(Color::White).bold())),
    Line::from(Span::styled(job.company.name.clone(), Style::default().fg(Color::Cyan))),
    Line::default(),
    field(
      "Location",
      if job.county.is_empty() || job.county == job.location {
        job.location.clone()
      } else {
        format!("{}, {}", job.location, job.county)
      },
    ),
    Line::from(vec![
      Span::styled(format!("{:<12}", "Work"), label),
      Span::styled(
        job.remote_type.label(),
        Style::default().fg(remote_type_color(job.remote_type)),
      ),
      Span::raw("  ·  "),
      Span::raw(job.employment_type.label()),
      Span::raw("  ·  "),
      Span::styled(
        job.experience_level.label(),
        Style::default().fg(experience_color(job.experience_level)),
      ),
    ]),
    field(
      "Salary",
      format_salary(job.salary_min, job.salary_max, &job.salary_currency),
    ),
    field("Posted", format_date(&job.posted_date)),
    field("Source", format!("{} {}", job.source_platform, job.source_url)),
  ];

  if !job.company.industry.is_empty() {
    lines.push(field("Industry", job.company.industry.clone()));
  }
  if !job.skills_required.is_empty() {
    lines.push(field("Skills", job.skills_required.join(", ")));
  }
  if !job.technologies.is_empty() {
    lines.push(field("Tech", job.technologies.join(", ")));
  }
  if !job.is_active {
    lines.push(Line::from(Span::styled(
      "This posting is no longer active.",
      Style::default().fg(Color::Red),
    )));
  }

  for (heading, body) in [("Description", &job.description), ("Requirements", &job.requirements)] {
    if body.trim().is_empty() {
      continue;
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(heading, Style::default().fg(Color::Yellow).bold())));
    lines.extend(body.lines().map(|l| Line::from(l.to_string())));
  }

  lines
}

impl View for JobDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::Char('g') => self.scroll = 0,
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let scroll = self.scroll;
    render_panel(
      frame,
      area,
      &self.title,
      self.job.state(),
      "",
      |_| false,
      |frame, inner, job| {
        let paragraph = Paragraph::new(detail_lines(job))
          .wrap(Wrap { trim: false })
          .scroll((scroll, 0));
        frame.render_widget(paragraph, inner);
      },
    );
  }

  fn breadcrumb_label(&self) -> String {
    self.title.clone()
  }

  fn tick(&mut self) -> bool {
    self.job.poll()
  }

  fn is_fetching(&self) -> bool {
    self.job.is_fetching()
  }

  fn refresh(&mut self) {
    // Also marks the posting stale for any other view holding it
    self.queries.invalidate(self.job.key());
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("j/k", "scroll").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
