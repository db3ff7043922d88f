use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use super::error::{ApiError, ApiResult};
use super::types::{
  Company, EmploymentTypeCount, ExperienceCount, HiringTrend, IndustryInsight, JobPosting,
  JobsQuery, LocationCount, MarketOverview, PageParams, Paginated, RemoteWorkTrend, SalaryInsight,
  SalaryQuery, ScrapeAck, SkillDemand,
};

/// HTTP client for the job-market API
#[derive(Clone, Debug)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
}

impl ApiClient {
  pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
    // Url::join drops the last path segment unless it ends with '/'
    let normalized = if base_url.ends_with('/') {
      base_url.to_string()
    } else {
      format!("{}/", base_url)
    };
    let base_url = Url::parse(&normalized).map_err(|source| ApiError::InvalidBaseUrl {
      url: base_url.to_string(),
      source,
    })?;

    let http = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("jobpulse/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|source| ApiError::from_reqwest(base_url.as_str(), source))?;

    Ok(Self { http, base_url })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Paginated, filtered job list
  pub async fn get_jobs(&self, query: &JobsQuery) -> ApiResult<Paginated<JobPosting>> {
    let request = self.jobs_request(query)?;
    self.execute(request).await
  }

  pub async fn get_job(&self, id: &str) -> ApiResult<JobPosting> {
    let request = self.request(Method::GET, &format!("jobs/{}/", id))?;
    self.execute(request).await
  }

  pub async fn get_companies(&self, page: PageParams) -> ApiResult<Paginated<Company>> {
    let request = self.request(Method::GET, "companies/")?.query(&page);
    self.execute(request).await
  }

  pub async fn get_skills(&self, page: PageParams) -> ApiResult<Paginated<SkillDemand>> {
    let request = self.request(Method::GET, "skills/")?.query(&page);
    self.execute(request).await
  }

  /// Most in-demand skills, computed live by the backend
  pub async fn get_top_skills(&self, limit: u32) -> ApiResult<Vec<SkillDemand>> {
    let request = self
      .request(Method::GET, "skills/top/")?
      .query(&[("limit", limit)]);
    self.execute(request).await
  }

  pub async fn get_market_overview(&self) -> ApiResult<MarketOverview> {
    let request = self.request(Method::GET, "analytics/market-overview/")?;
    self.execute(request).await
  }

  pub async fn get_location_distribution(&self) -> ApiResult<Vec<LocationCount>> {
    let request = self.request(Method::GET, "analytics/location-distribution/")?;
    self.execute(request).await
  }

  pub async fn get_experience_distribution(&self) -> ApiResult<Vec<ExperienceCount>> {
    let request = self.request(Method::GET, "analytics/experience-distribution/")?;
    self.execute(request).await
  }

  pub async fn get_employment_type_distribution(&self) -> ApiResult<Vec<EmploymentTypeCount>> {
    let request = self.request(Method::GET, "analytics/employment-type-distribution/")?;
    self.execute(request).await
  }

  pub async fn get_industry_insights(&self) -> ApiResult<Vec<IndustryInsight>> {
    let request = self.request(Method::GET, "analytics/industry-insights/")?;
    self.execute(request).await
  }

  pub async fn get_remote_work_trends(&self) -> ApiResult<Vec<RemoteWorkTrend>> {
    let request = self.request(Method::GET, "analytics/remote-work-trends/")?;
    self.execute(request).await
  }

  /// Daily posting counts over the last `period_days` days
  pub async fn get_hiring_trends(&self, period_days: u32) -> ApiResult<Vec<HiringTrend>> {
    let request = self
      .request(Method::GET, "analytics/hiring-trends/")?
      .query(&[("period", period_days)]);
    self.execute(request).await
  }

  pub async fn get_salary_insights(&self, query: &SalaryQuery) -> ApiResult<SalaryInsight> {
    let request = self
      .request(Method::GET, "analytics/salary-insights/")?
      .query(query);
    self.execute(request).await
  }

  /// Ask the backend to start a scraping run. Returns as soon as it is queued.
  pub async fn trigger_scraping(&self) -> ApiResult<ScrapeAck> {
    let request = self.request(Method::POST, "admin/trigger-scraping/")?;
    self.execute(request).await
  }

  fn jobs_request(&self, query: &JobsQuery) -> ApiResult<RequestBuilder> {
    Ok(
      self
        .request(Method::GET, "jobs/")?
        .query(&query.filters)
        .query(&[("page", query.page), ("page_size", query.page_size)]),
    )
  }

  fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
    let url = self
      .base_url
      .join(path)
      .map_err(|source| ApiError::InvalidBaseUrl {
        url: format!("{}{}", self.base_url, path),
        source,
      })?;
    Ok(self.http.request(method, url))
  }

  async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
    let request = request
      .build()
      .map_err(|e| ApiError::from_reqwest(self.base_url.as_str(), e))?;
    let method = request.method().clone();
    let url = request.url().to_string();
    debug!(%method, %url, "API request");

    let response = match self.http.execute(request).await {
      Ok(response) => response,
      Err(e) => {
        let err = ApiError::from_reqwest(url.as_str(), e);
        error!(%method, %url, error = %err, "API request failed");
        return Err(err);
      }
    };

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      error!(%method, %url, status = status.as_u16(), "API returned error status");
      return Err(ApiError::HttpStatus {
        url,
        status: status.as_u16(),
        body,
      });
    }

    response.json::<T>().await.map_err(|e| {
      let err = ApiError::from_reqwest(url.as_str(), e);
      error!(%method, %url, error = %err, "Failed to decode API response");
      err
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{EmploymentType, RemoteType, SearchFilters};

  fn client() -> ApiClient {
    ApiClient::new("http://localhost:8000/api", Duration::from_secs(10)).unwrap()
  }

  #[test]
  fn test_base_url_keeps_api_prefix() {
    let request = client()
      .request(Method::GET, "analytics/market-overview/")
      .unwrap()
      .build()
      .unwrap();
    assert_eq!(
      request.url().as_str(),
      "http://localhost:8000/api/analytics/market-overview/"
    );
  }

  #[test]
  fn test_jobs_query_string() {
    let query = JobsQuery {
      filters: SearchFilters {
        search: Some("rust developer".into()),
        employment_type: Some(EmploymentType::FullTime),
        remote_type: Some(RemoteType::Remote),
        min_salary: Some(100000),
        ..Default::default()
      },
      page: 2,
      page_size: 20,
    };
    let request = client().jobs_request(&query).unwrap().build().unwrap();
    assert_eq!(request.url().path(), "/api/jobs/");
    assert_eq!(
      request.url().query(),
      Some(
        "search=rust+developer&employment_type=full_time&remote_type=remote&min_salary=100000&page=2&page_size=20"
      )
    );
  }

  #[test]
  fn test_empty_filters_only_send_paging() {
    let query = JobsQuery {
      filters: SearchFilters::default(),
      page: 1,
      page_size: 20,
    };
    let request = client().jobs_request(&query).unwrap().build().unwrap();
    assert_eq!(request.url().query(), Some("page=1&page_size=20"));
  }

  #[test]
  fn test_invalid_base_url() {
    let err = ApiClient::new("not a url", Duration::from_secs(10)).unwrap_err();
    assert!(matches!(err, ApiError::InvalidBaseUrl { .. }));
  }
}
