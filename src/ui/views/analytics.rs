use crate::api::{
  Company, EmploymentType, EmploymentTypeCount, ExperienceCount, ExperienceLevel, IndustryInsight, PageParams, Paginated,
  RemoteWorkTrend, SalaryInsight, SalaryQuery, SkillDemand,
};
use crate::app::AppContext;
use crate::format::{format_currency, humanize_enum};
use crate::query::QueryObserver;
use crate::ui::components::{render_panel, KeyResult, PromptEvent, PromptInput};
use crate::ui::renderfns::{bar, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::dashboard::{render_remote_trends, render_top_skills};
use crate::ui::views::queries;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Row, Table};

/// First page of the company and skill catalogs
const CATALOG_PAGE: PageParams = PageParams {
  page: 1,
  page_size: 10,
};

/// Distributions, industry breakdown, catalogs and salary insights
pub struct AnalyticsView {
  ctx: AppContext,
  salary_query: SalaryQuery,
  salary: QueryObserver<SalaryInsight>,
  experience: QueryObserver<Vec<ExperienceCount>>,
  employment: QueryObserver<Vec<EmploymentTypeCount>>,
  industries: QueryObserver<Vec<IndustryInsight>>,
  top_skills: QueryObserver<Vec<SkillDemand>>,
  remote_trends: QueryObserver<Vec<RemoteWorkTrend>>,
  companies: QueryObserver<Paginated<Company>>,
  skills: QueryObserver<Paginated<SkillDemand>>,
  title_prompt: PromptInput,
}

impl AnalyticsView {
  pub fn new(ctx: AppContext) -> Self {
    let salary_query = SalaryQuery::default();
    Self {
      salary: queries::salary_insights(&ctx, salary_query.clone()),
      experience: queries::experience_distribution(&ctx),
      employment: queries::employment_type_distribution(&ctx),
      industries: queries::industry_insights(&ctx),
      top_skills: queries::top_skills(&ctx),
      remote_trends: queries::remote_work_trends(&ctx),
      companies: queries::companies(&ctx, CATALOG_PAGE),
      skills: queries::skills(&ctx, CATALOG_PAGE),
      salary_query,
      title_prompt: PromptInput::new("> "),
      ctx,
    }
  }

  /// Narrow salary insights to a job title; empty shows the whole market
  fn set_salary_title(&mut self, title: &str) {
    let title = title.trim();
    let job_title = (!title.is_empty()).then(|| title.to_string());
    if job_title == self.salary_query.job_title {
      return;
    }
    self.salary_query.job_title = job_title;
    // Replacing the observer unsubscribes from the old key
    self.salary = queries::salary_insights(&self.ctx, self.salary_query.clone());
  }

  fn salary_title(&self) -> String {
    match &self.salary_query.job_title {
      Some(title) => format!("Salary Insights: {}", title),
      None => "Salary Insights".to_string(),
    }
  }
}

impl View for AnalyticsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.title_prompt.handle_key(key) {
      KeyResult::Event(PromptEvent::Submitted(title)) => {
        self.set_salary_title(&title);
        return ViewAction::None;
      }
      KeyResult::Event(_) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('t') => {
        let current = self.salary_query.job_title.clone().unwrap_or_default();
        self.title_prompt.activate("Salary insights for job title", &current);
      }
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let rows = Layout::vertical([Constraint::Ratio(1, 4); 4]).split(area);
    let halves = |row: Rect| -> [Rect; 2] {
      Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(row)
    };

    let [salary_area, experience_area] = halves(rows[0]);
    let [employment_area, industry_area] = halves(rows[1]);
    let [skills_area, remote_area] = halves(rows[2]);
    let [companies_area, catalog_area] = halves(rows[3]);

    render_salary(frame, salary_area, &self.salary_title(), &self.salary);
    render_experience(frame, experience_area, &self.experience);
    render_employment(frame, employment_area, &self.employment);
    render_industries(frame, industry_area, &self.industries);
    render_top_skills(frame, skills_area, &self.top_skills);
    render_remote_trends(frame, remote_area, &self.remote_trends);
    render_companies(frame, companies_area, &self.companies);
    render_skill_catalog(frame, catalog_area, &self.skills);

    self.title_prompt.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Analytics".to_string()
  }

  fn tick(&mut self) -> bool {
    [
      self.salary.poll(),
      self.experience.poll(),
      self.employment.poll(),
      self.industries.poll(),
      self.top_skills.poll(),
      self.remote_trends.poll(),
      self.companies.poll(),
      self.skills.poll(),
    ]
    .contains(&true)
  }

  fn is_capturing_input(&self) -> bool {
    self.title_prompt.is_active()
  }

  fn is_fetching(&self) -> bool {
    self.salary.is_fetching()
      || self.experience.is_fetching()
      || self.employment.is_fetching()
      || self.industries.is_fetching()
      || self.top_skills.is_fetching()
      || self.remote_trends.is_fetching()
      || self.companies.is_fetching()
      || self.skills.is_fetching()
  }

  fn refresh(&mut self) {
    self.salary.refetch();
    self.experience.refetch();
    self.employment.refetch();
    self.industries.refetch();
    self.top_skills.refetch();
    self.remote_trends.refetch();
    self.companies.refetch();
    self.skills.refetch();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("t", "salary by title").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

fn amount(value: Option<f64>) -> String {
  value
    .map(|v| format_currency(v, "KES"))
    .unwrap_or_else(|| "n/a".to_string())
}

fn render_salary(frame: &mut Frame, area: Rect, title: &str, salary: &QueryObserver<SalaryInsight>) {
  render_panel(
    frame,
    area,
    title,
    salary.state(),
    "No salary data for this selection.",
    |s| s.sample_size == 0,
    |frame, inner, insight| {
      let stats = &insight.overall_stats;
      let [summary, table_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(1)]).areas(inner);

      let label = Style::default().fg(Color::DarkGray);
      frame.render_widget(
        Paragraph::new(vec![
          Line::from(vec![
            Span::styled("Average ", label),
            Span::raw(amount(stats.avg_salary)),
            Span::styled("   Median ", label),
            Span::raw(amount(stats.median_salary)),
          ]),
          Line::from(vec![
            Span::styled("Range   ", label),
            Span::raw(format!("{} - {}", amount(stats.min_salary), amount(stats.max_salary))),
          ]),
          Line::from(Span::styled(
            format!("Based on {} postings", insight.sample_size),
            label,
          )),
        ]),
        summary,
      );

      let rows = insight.by_experience_level.iter().map(|row| {
        Row::new(vec![
          experience_label(&row.experience_level),
          amount(row.avg_salary),
          row.job_count.to_string(),
        ])
      });
      let table = Table::new(
        rows,
        [Constraint::Length(12), Constraint::Length(16), Constraint::Min(4)],
      )
      .header(Row::new(vec!["Level", "Average", "Jobs"]).style(label));
      frame.render_widget(table, table_area);
    },
  );
}

fn experience_label(value: &str) -> String {
  ExperienceLevel::from_api(value).map_or_else(|| humanize_enum(value), |v| v.label().to_string())
}

/// Rows of `label | bar | count` for a distribution
fn distribution_table<'a>(items: impl Iterator<Item = (String, u64)>, color: Color) -> Table<'a> {
  let items: Vec<(String, u64)> = items.collect();
  let max = items.iter().map(|(_, n)| *n).max().unwrap_or(0) as f64;
  let rows = items.into_iter().map(move |(label, count)| {
    Row::new(vec![
      Span::raw(truncate(&label, 16)),
      Span::styled(bar(count as f64, max, 20), Style::default().fg(color)),
      Span::raw(count.to_string()),
    ])
  });
  Table::new(
    rows,
    [Constraint::Length(16), Constraint::Length(20), Constraint::Min(4)],
  )
}

fn render_experience(frame: &mut Frame, area: Rect, experience: &QueryObserver<Vec<ExperienceCount>>) {
  render_panel(
    frame,
    area,
    "Experience Levels",
    experience.state(),
    "No experience data yet.",
    Vec::is_empty,
    |frame, inner, levels| {
      let items = levels
        .iter()
        .map(|l| (experience_label(&l.experience_level), l.job_count));
      frame.render_widget(distribution_table(items, Color::Magenta), inner);
    },
  );
}

fn render_employment(frame: &mut Frame, area: Rect, employment: &QueryObserver<Vec<EmploymentTypeCount>>) {
  render_panel(
    frame,
    area,
    "Employment Types",
    employment.state(),
    "No employment type data yet.",
    Vec::is_empty,
    |frame, inner, types| {
      let items = types
        .iter()
        .map(|t| {
          let label = EmploymentType::from_api(&t.employment_type)
            .map_or_else(|| humanize_enum(&t.employment_type), |v| v.label().to_string());
          (label, t.job_count)
        });
      frame.render_widget(distribution_table(items, Color::Cyan), inner);
    },
  );
}

fn render_industries(frame: &mut Frame, area: Rect, industries: &QueryObserver<Vec<IndustryInsight>>) {
  render_panel(
    frame,
    area,
    "Industries",
    industries.state(),
    "No industry data yet.",
    Vec::is_empty,
    |frame, inner, industries| {
      let rows = industries.iter().map(|i| {
        Row::new(vec![
          truncate(&i.industry, 20),
          i.job_count.to_string(),
          amount(i.avg_salary),
        ])
      });
      let table = Table::new(
        rows,
        [Constraint::Length(20), Constraint::Length(6), Constraint::Min(10)],
      )
      .header(Row::new(vec!["Industry", "Jobs", "Avg salary"]).style(Style::default().fg(Color::DarkGray)));
      frame.render_widget(table, inner);
    },
  );
}

fn render_companies(frame: &mut Frame, area: Rect, companies: &QueryObserver<Paginated<Company>>) {
  let title = match companies.data() {
    Some(page) => format!("Companies ({})", page.count),
    None => "Companies".to_string(),
  };
  render_panel(
    frame,
    area,
    &title,
    companies.state(),
    "No companies yet.",
    Paginated::is_empty,
    |frame, inner, page| {
      let rows = page.results.iter().map(|c| {
        Row::new(vec![
          truncate(&c.name, 24),
          truncate(&c.industry, 16),
          c.job_count.map(|n| n.to_string()).unwrap_or_default(),
        ])
      });
      let table = Table::new(
        rows,
        [Constraint::Length(24), Constraint::Length(16), Constraint::Min(4)],
      )
      .header(Row::new(vec!["Company", "Industry", "Jobs"]).style(Style::default().fg(Color::DarkGray)));
      frame.render_widget(table, inner);
    },
  );
}

fn growth(rate: Option<f64>) -> Span<'static> {
  match rate {
    Some(r) if r > 0.0 => Span::styled(format!("+{:.1}%", r), Style::default().fg(Color::Green)),
    Some(r) if r < 0.0 => Span::styled(format!("{:.1}%", r), Style::default().fg(Color::Red)),
    Some(_) => Span::raw("0.0%"),
    None => Span::styled("n/a", Style::default().fg(Color::DarkGray)),
  }
}

fn render_skill_catalog(frame: &mut Frame, area: Rect, skills: &QueryObserver<Paginated<SkillDemand>>) {
  render_panel(
    frame,
    area,
    "Skill Catalog",
    skills.state(),
    "No skills tracked yet.",
    Paginated::is_empty,
    |frame, inner, page| {
      let rows = page.results.iter().map(|s| {
        Row::new(vec![
          Span::raw(truncate(&s.skill_name, 20)),
          Span::raw(s.demand_count.to_string()),
          growth(s.growth_rate),
        ])
      });
      let table = Table::new(
        rows,
        [Constraint::Length(20), Constraint::Length(8), Constraint::Min(6)],
      )
      .header(Row::new(vec!["Skill", "Demand", "Growth"]).style(Style::default().fg(Color::DarkGray)));
      frame.render_widget(table, inner);
    },
  );
}
