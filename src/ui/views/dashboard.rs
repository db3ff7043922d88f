use crate::api::{HiringTrend, LocationCount, MarketOverview, RemoteWorkTrend, SkillDemand};
use crate::app::AppContext;
use crate::format::{format_currency, format_number};
use crate::query::QueryObserver;
use crate::ui::components::render_panel;
use crate::ui::renderfns::{bar, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{queries, JobListView};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Sparkline, Table};

const BAR_WIDTH: usize = 24;

/// Landing view: headline numbers, top skills, locations and trends
pub struct DashboardView {
  ctx: AppContext,
  overview: QueryObserver<MarketOverview>,
  top_skills: QueryObserver<Vec<SkillDemand>>,
  locations: QueryObserver<Vec<LocationCount>>,
  remote_trends: QueryObserver<Vec<RemoteWorkTrend>>,
  hiring: QueryObserver<Vec<HiringTrend>>,
}

impl DashboardView {
  pub fn new(ctx: AppContext) -> Self {
    Self {
      overview: queries::market_overview(&ctx),
      top_skills: queries::top_skills(&ctx),
      locations: queries::location_distribution(&ctx),
      remote_trends: queries::remote_work_trends(&ctx),
      hiring: queries::hiring_trends(&ctx),
      ctx,
    }
  }
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Char('j') | KeyCode::Enter => {
        return ViewAction::Push(Box::new(JobListView::from_context(&self.ctx)));
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let [cards, middle, bottom] = Layout::vertical([
      Constraint::Length(4),
      Constraint::Percentage(55),
      Constraint::Min(6),
    ])
    .areas(area);

    render_overview(frame, cards, &self.overview);

    let [skills_area, locations_area] =
      Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(middle);
    render_top_skills(frame, skills_area, &self.top_skills);
    render_locations(frame, locations_area, &self.locations);

    let [hiring_area, remote_area] =
      Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(bottom);
    render_hiring_trends(frame, hiring_area, &self.hiring);
    render_remote_trends(frame, remote_area, &self.remote_trends);
  }

  fn breadcrumb_label(&self) -> String {
    "Dashboard".to_string()
  }

  fn tick(&mut self) -> bool {
    // Poll every observer, no short-circuit
    [
      self.overview.poll(),
      self.top_skills.poll(),
      self.locations.poll(),
      self.remote_trends.poll(),
      self.hiring.poll(),
    ]
    .contains(&true)
  }

  fn is_fetching(&self) -> bool {
    self.overview.is_fetching()
      || self.top_skills.is_fetching()
      || self.locations.is_fetching()
      || self.remote_trends.is_fetching()
      || self.hiring.is_fetching()
  }

  fn refresh(&mut self) {
    self.overview.refetch();
    self.top_skills.refetch();
    self.locations.refetch();
    self.remote_trends.refetch();
    self.hiring.refetch();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("j", "jobs").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}

pub(super) fn render_overview(frame: &mut Frame, area: Rect, overview: &QueryObserver<MarketOverview>) {
  render_panel(
    frame,
    area,
    "Market Overview",
    overview.state(),
    "",
    |_| false,
    |frame, inner, o| {
      let cards = [
        ("Active jobs", format_number(o.total_active_jobs as f64)),
        ("New (30 days)", format_number(o.new_jobs_last_30_days as f64)),
        (
          "Remote",
          format!(
            "{} ({:.1}%)",
            format_number(o.remote_opportunities as f64),
            o.remote_percentage
          ),
        ),
        (
          "Average salary",
          o.average_salary
            .map(|s| format_currency(s, "KES"))
            .unwrap_or_else(|| "n/a".to_string()),
        ),
      ];
      let areas = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(inner);
      for ((label, value), area) in cards.into_iter().zip(areas.iter()) {
        let card = Paragraph::new(vec![
          Line::from(Span::styled(label, Style::default().fg(Color::DarkGray))),
          Line::from(Span::styled(value, Style::default().fg(Color::White).bold())),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(card, *area);
      }
    },
  );
}

pub(super) fn render_top_skills(frame: &mut Frame, area: Rect, skills: &QueryObserver<Vec<SkillDemand>>) {
  render_panel(
    frame,
    area,
    "Top Skills",
    skills.state(),
    "No skill data yet.",
    Vec::is_empty,
    |frame, inner, skills| {
      let max = skills.iter().map(|s| s.demand_count).max().unwrap_or(0) as f64;
      let rows = skills.iter().map(|skill| {
        Row::new(vec![
          Span::styled(truncate(&skill.skill_name, 18), Style::default().fg(Color::Cyan)),
          Span::styled(
            bar(skill.demand_count as f64, max, BAR_WIDTH),
            Style::default().fg(Color::Blue),
          ),
          Span::raw(skill.demand_count.to_string()),
        ])
      });
      let table = Table::new(
        rows,
        [Constraint::Length(18), Constraint::Length(BAR_WIDTH as u16), Constraint::Min(4)],
      );
      frame.render_widget(table, inner);
    },
  );
}

fn render_locations(frame: &mut Frame, area: Rect, locations: &QueryObserver<Vec<LocationCount>>) {
  render_panel(
    frame,
    area,
    "Jobs by County",
    locations.state(),
    "No location data yet.",
    Vec::is_empty,
    |frame, inner, locations| {
      let max = locations.iter().map(|l| l.job_count).max().unwrap_or(0) as f64;
      let rows = locations.iter().map(|loc| {
        let county = if loc.county.is_empty() { "Unknown" } else { loc.county.as_str() };
        Row::new(vec![
          Span::raw(truncate(county, 16)),
          Span::styled(bar(loc.job_count as f64, max, 16), Style::default().fg(Color::Green)),
          Span::raw(loc.job_count.to_string()),
        ])
      });
      let table = Table::new(
        rows,
        [Constraint::Length(16), Constraint::Length(16), Constraint::Min(4)],
      );
      frame.render_widget(table, inner);
    },
  );
}

fn render_hiring_trends(frame: &mut Frame, area: Rect, hiring: &QueryObserver<Vec<HiringTrend>>) {
  render_panel(
    frame,
    area,
    "Hiring Trend",
    hiring.state(),
    "No postings in this period.",
    Vec::is_empty,
    |frame, inner, trends| {
      let values: Vec<u64> = trends.iter().map(|t| t.job_count).collect();
      let total: u64 = values.iter().sum();
      let [chart, caption] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
      frame.render_widget(
        Sparkline::default()
          .data(&values)
          .style(Style::default().fg(Color::Yellow)),
        chart,
      );
      let first = trends.first().map(|t| t.date.as_str()).unwrap_or_default();
      let last = trends.last().map(|t| t.date.as_str()).unwrap_or_default();
      frame.render_widget(
        Paragraph::new(format!("{} to {}: {} postings", first, last, total))
          .style(Style::default().fg(Color::DarkGray)),
        caption,
      );
    },
  );
}

pub(super) fn render_remote_trends(
  frame: &mut Frame,
  area: Rect,
  remote: &QueryObserver<Vec<RemoteWorkTrend>>,
) {
  render_panel(
    frame,
    area,
    "Remote Work",
    remote.state(),
    "No remote work data yet.",
    Vec::is_empty,
    |frame, inner, trends| {
      let header = Row::new(vec!["Month", "Jobs", "Remote", "%"])
        .style(Style::default().fg(Color::DarkGray));
      let rows = trends.iter().map(|t| {
        Row::new(vec![
          t.month.clone(),
          t.total_jobs.to_string(),
          t.remote_jobs.to_string(),
          format!("{:.1}", t.remote_percentage),
        ])
      });
      let table = Table::new(
        rows,
        [
          Constraint::Length(10),
          Constraint::Length(7),
          Constraint::Length(7),
          Constraint::Min(5),
        ],
      )
      .header(header)
      .block(Block::default().borders(Borders::NONE));
      frame.render_widget(table, inner);
    },
  );
}
