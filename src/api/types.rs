//! Serde types matching the job-market API.

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Enumerations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteType {
  OnSite,
  Remote,
  Hybrid,
}

impl RemoteType {
  pub const ALL: &'static [RemoteType] = &[RemoteType::OnSite, RemoteType::Remote, RemoteType::Hybrid];

  pub fn label(&self) -> &'static str {
    match self {
      RemoteType::OnSite => "On-site",
      RemoteType::Remote => "Remote",
      RemoteType::Hybrid => "Hybrid",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
  FullTime,
  PartTime,
  Contract,
  Internship,
  Freelance,
}

impl EmploymentType {
  pub const ALL: &'static [EmploymentType] = &[
    EmploymentType::FullTime,
    EmploymentType::PartTime,
    EmploymentType::Contract,
    EmploymentType::Internship,
    EmploymentType::Freelance,
  ];

  /// Parse the wire value the analytics endpoints report as a plain string
  pub fn from_api(value: &str) -> Option<Self> {
    Self::ALL.iter().copied().find(|v| v.as_str() == value)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      EmploymentType::FullTime => "full_time",
      EmploymentType::PartTime => "part_time",
      EmploymentType::Contract => "contract",
      EmploymentType::Internship => "internship",
      EmploymentType::Freelance => "freelance",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      EmploymentType::FullTime => "Full Time",
      EmploymentType::PartTime => "Part Time",
      EmploymentType::Contract => "Contract",
      EmploymentType::Internship => "Internship",
      EmploymentType::Freelance => "Freelance",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
  Entry,
  Mid,
  Senior,
  Executive,
}

impl ExperienceLevel {
  pub const ALL: &'static [ExperienceLevel] = &[
    ExperienceLevel::Entry,
    ExperienceLevel::Mid,
    ExperienceLevel::Senior,
    ExperienceLevel::Executive,
  ];

  /// Parse the wire value the analytics endpoints report as a plain string
  pub fn from_api(value: &str) -> Option<Self> {
    Self::ALL.iter().copied().find(|v| v.as_str() == value)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      ExperienceLevel::Entry => "entry",
      ExperienceLevel::Mid => "mid",
      ExperienceLevel::Senior => "senior",
      ExperienceLevel::Executive => "executive",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      ExperienceLevel::Entry => "Entry Level",
      ExperienceLevel::Mid => "Mid Level",
      ExperienceLevel::Senior => "Senior Level",
      ExperienceLevel::Executive => "Executive",
    }
  }
}

// ============================================================================
// Jobs and companies
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub industry: String,
  #[serde(default)]
  pub size: String,
  #[serde(default)]
  pub location: String,
  #[serde(default)]
  pub website: String,
  #[serde(default)]
  pub logo_url: String,
  #[serde(default)]
  pub job_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
  pub id: String,
  pub title: String,
  pub company: Company,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub requirements: String,
  #[serde(default)]
  pub location: String,
  #[serde(default)]
  pub county: String,
  pub remote_type: RemoteType,
  pub employment_type: EmploymentType,
  pub experience_level: ExperienceLevel,
  #[serde(default, deserialize_with = "deserialize_decimal")]
  pub salary_min: Option<f64>,
  #[serde(default, deserialize_with = "deserialize_decimal")]
  pub salary_max: Option<f64>,
  #[serde(default = "default_currency")]
  pub salary_currency: String,
  #[serde(default)]
  pub skills_required: Vec<String>,
  #[serde(default)]
  pub technologies: Vec<String>,
  #[serde(default)]
  pub source_platform: String,
  #[serde(default)]
  pub source_url: String,
  #[serde(default)]
  pub posted_date: String,
  #[serde(default)]
  pub scraped_at: String,
  #[serde(default = "default_true")]
  pub is_active: bool,
  #[serde(default)]
  pub view_count: u64,
}

/// Page of results from a paginated list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
  pub count: u64,
  pub next: Option<String>,
  pub previous: Option<String>,
  #[serde(default = "Vec::new")]
  pub results: Vec<T>,
}

impl<T> Paginated<T> {
  pub fn is_empty(&self) -> bool {
    self.results.is_empty()
  }
}

// ============================================================================
// Skills and analytics
// ============================================================================

/// Demand for one skill.
///
/// `/skills/` returns the stored model (`skill_name`, `avg_salary`) while
/// `/skills/top/` returns live aggregates (`skill`, `average_salary`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDemand {
  #[serde(alias = "skill")]
  pub skill_name: String,
  pub demand_count: u64,
  #[serde(default, deserialize_with = "deserialize_decimal")]
  pub growth_rate: Option<f64>,
  #[serde(
    default,
    alias = "average_salary",
    deserialize_with = "deserialize_decimal"
  )]
  pub avg_salary: Option<f64>,
  #[serde(default)]
  pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOverview {
  pub total_active_jobs: u64,
  pub new_jobs_last_30_days: u64,
  pub remote_opportunities: u64,
  pub remote_percentage: f64,
  #[serde(default, deserialize_with = "deserialize_decimal")]
  pub average_salary: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCount {
  #[serde(default)]
  pub county: String,
  pub job_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceCount {
  pub experience_level: String,
  pub job_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentTypeCount {
  pub employment_type: String,
  pub job_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteWorkTrend {
  pub month: String,
  pub total_jobs: u64,
  pub remote_jobs: u64,
  pub remote_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiringTrend {
  pub date: String,
  pub job_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryInsight {
  pub industry: String,
  pub job_count: u64,
  #[serde(default, deserialize_with = "deserialize_decimal")]
  pub avg_salary: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryStats {
  #[serde(default, deserialize_with = "deserialize_decimal")]
  pub min_salary: Option<f64>,
  #[serde(default, deserialize_with = "deserialize_decimal")]
  pub max_salary: Option<f64>,
  #[serde(default, deserialize_with = "deserialize_decimal")]
  pub avg_salary: Option<f64>,
  #[serde(default, deserialize_with = "deserialize_decimal")]
  pub median_salary: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryByExperience {
  pub experience_level: String,
  #[serde(default, deserialize_with = "deserialize_decimal")]
  pub avg_salary: Option<f64>,
  pub job_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryInsight {
  pub overall_stats: SalaryStats,
  #[serde(default)]
  pub by_experience_level: Vec<SalaryByExperience>,
  pub sample_size: u64,
}

/// Acknowledgement of a scraping request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrapeAck {
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub task_id: Option<String>,
}

// ============================================================================
// Request parameters
// ============================================================================

/// Filters accepted by the job list endpoint.
///
/// Also part of the cache key for job list queries, so field order matters
/// only in that it must stay stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SearchFilters {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub search: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub county: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub skills: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub employment_type: Option<EmploymentType>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub experience_level: Option<ExperienceLevel>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub remote_type: Option<RemoteType>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub min_salary: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_salary: Option<u64>,
}

impl SearchFilters {
  /// Number of fields that currently restrict results
  pub fn active_count(&self) -> usize {
    [
      self.search.is_some(),
      self.location.is_some(),
      self.county.is_some(),
      self.skills.is_some(),
      self.employment_type.is_some(),
      self.experience_level.is_some(),
      self.remote_type.is_some(),
      self.min_salary.is_some(),
      self.max_salary.is_some(),
    ]
    .into_iter()
    .filter(|active| *active)
    .count()
  }

  pub fn is_empty(&self) -> bool {
    self.active_count() == 0
  }
}

/// Parameters of a job list request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct JobsQuery {
  pub filters: SearchFilters,
  pub page: u32,
  pub page_size: u32,
}

/// Parameters of a plain paginated list request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageParams {
  pub page: u32,
  pub page_size: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SalaryQuery {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub job_title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

fn default_currency() -> String {
  "KES".to_string()
}

fn default_true() -> bool {
  true
}

/// Decimal fields arrive either as JSON numbers or as strings ("150000.00").
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Decimal {
    Number(f64),
    Text(String),
  }

  match Option::<Decimal>::deserialize(deserializer)? {
    None => Ok(None),
    Some(Decimal::Number(n)) => Ok(Some(n)),
    Some(Decimal::Text(s)) if s.trim().is_empty() => Ok(None),
    Some(Decimal::Text(s)) => s
      .trim()
      .parse::<f64>()
      .map(Some)
      .map_err(|e| serde::de::Error::custom(format!("invalid decimal {:?}: {}", s, e))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn job_json(salary_min: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
      "id": "4f1c",
      "title": "Backend Engineer",
      "company": {"id": 3, "name": "Safari Tech", "industry": "Technology"},
      "description": "Build APIs",
      "requirements": "",
      "location": "Nairobi",
      "county": "Nairobi",
      "remote_type": "hybrid",
      "employment_type": "full_time",
      "experience_level": "mid",
      "salary_min": salary_min,
      "salary_max": null,
      "salary_currency": "KES",
      "skills_required": ["Python", "Django"],
      "technologies": [],
      "source_platform": "linkedin",
      "source_url": "https://example.com/job",
      "posted_date": "2024-03-05T10:00:00Z",
      "scraped_at": "2024-03-06T10:00:00Z",
      "is_active": true
    })
  }

  #[test]
  fn test_analytics_strings_map_to_variants() {
    assert_eq!(EmploymentType::from_api("part_time"), Some(EmploymentType::PartTime));
    assert_eq!(ExperienceLevel::from_api("senior"), Some(ExperienceLevel::Senior));
    assert_eq!(ExperienceLevel::from_api("principal"), None);
  }

  #[test]
  fn test_job_posting_with_string_decimal() {
    let job: JobPosting = serde_json::from_value(job_json(serde_json::json!("150000.00"))).unwrap();
    assert_eq!(job.salary_min, Some(150000.0));
    assert_eq!(job.salary_max, None);
    assert_eq!(job.remote_type, RemoteType::Hybrid);
    assert_eq!(job.employment_type, EmploymentType::FullTime);
    assert_eq!(job.view_count, 0);
    assert_eq!(job.company.website, "");
  }

  #[test]
  fn test_job_posting_with_numeric_decimal() {
    let job: JobPosting = serde_json::from_value(job_json(serde_json::json!(90000))).unwrap();
    assert_eq!(job.salary_min, Some(90000.0));
  }

  #[test]
  fn test_top_skill_aliases() {
    let skill: SkillDemand = serde_json::from_value(serde_json::json!({
      "skill": "Python",
      "demand_count": 120,
      "average_salary": 180000.5
    }))
    .unwrap();
    assert_eq!(skill.skill_name, "Python");
    assert_eq!(skill.avg_salary, Some(180000.5));
    assert_eq!(skill.growth_rate, None);
  }

  #[test]
  fn test_paginated_response() {
    let page: Paginated<Company> = serde_json::from_value(serde_json::json!({
      "count": 1,
      "next": null,
      "previous": null,
      "results": [{"id": 1, "name": "Acme", "job_count": 4}]
    }))
    .unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].job_count, Some(4));
  }

  #[test]
  fn test_active_filter_count() {
    let mut filters = SearchFilters::default();
    assert!(filters.is_empty());
    filters.location = Some("Nairobi".into());
    filters.remote_type = Some(RemoteType::Remote);
    assert_eq!(filters.active_count(), 2);
  }

  #[test]
  fn test_filters_skip_unset_fields() {
    let filters = SearchFilters {
      employment_type: Some(EmploymentType::FullTime),
      ..Default::default()
    };
    assert_eq!(
      serde_json::to_string(&filters).unwrap(),
      r#"{"employment_type":"full_time"}"#
    );
  }
}
