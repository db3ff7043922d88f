//! Query subscriptions shared by the views.
//!
//! Every panel subscribes through here so two views showing the same data
//! share one cache entry.

use std::future::Future;
use std::time::Duration;

use crate::api::{
  ApiClient, ApiResult, Company, EmploymentTypeCount, ExperienceCount, HiringTrend, IndustryInsight,
  LocationCount, MarketOverview, PageParams, Paginated, RemoteWorkTrend, SalaryInsight, SalaryQuery,
  SkillDemand,
};
use crate::app::AppContext;
use crate::query::{QueryError, QueryKey, QueryObserver, QueryOptions};

const HIRING_TRENDS_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Subscribe to `key`, fetching with `call` against the API client.
fn api_query<T, F, Fut>(ctx: &AppContext, key: QueryKey, options: QueryOptions, call: F) -> QueryObserver<T>
where
  T: Send + Sync + 'static,
  F: Fn(ApiClient) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = ApiResult<T>> + Send + 'static,
{
  let api = ctx.api.clone();
  ctx.queries.subscribe(
    key,
    move || {
      let fut = call(api.clone());
      async move { fut.await.map_err(QueryError::from) }
    },
    options,
  )
}

pub fn market_overview(ctx: &AppContext) -> QueryObserver<MarketOverview> {
  let options = ctx
    .queries
    .default_options()
    .with_refetch_interval(ctx.config.overview_refresh());
  api_query(ctx, QueryKey::new("market_overview"), options, |api| async move {
    api.get_market_overview().await
  })
}

pub fn top_skills(ctx: &AppContext) -> QueryObserver<Vec<SkillDemand>> {
  let limit = ctx.config.dashboard.top_skills_limit;
  api_query(
    ctx,
    QueryKey::with_params("top_skills", &limit),
    ctx.queries.default_options(),
    move |api| async move { api.get_top_skills(limit).await },
  )
}

pub fn location_distribution(ctx: &AppContext) -> QueryObserver<Vec<LocationCount>> {
  api_query(
    ctx,
    QueryKey::new("location_distribution"),
    ctx.queries.default_options(),
    |api| async move { api.get_location_distribution().await },
  )
}

pub fn experience_distribution(ctx: &AppContext) -> QueryObserver<Vec<ExperienceCount>> {
  api_query(
    ctx,
    QueryKey::new("experience_distribution"),
    ctx.queries.default_options(),
    |api| async move { api.get_experience_distribution().await },
  )
}

pub fn employment_type_distribution(ctx: &AppContext) -> QueryObserver<Vec<EmploymentTypeCount>> {
  api_query(
    ctx,
    QueryKey::new("employment_type_distribution"),
    ctx.queries.default_options(),
    |api| async move { api.get_employment_type_distribution().await },
  )
}

pub fn industry_insights(ctx: &AppContext) -> QueryObserver<Vec<IndustryInsight>> {
  api_query(
    ctx,
    QueryKey::new("industry_insights"),
    ctx.queries.default_options(),
    |api| async move { api.get_industry_insights().await },
  )
}

pub fn remote_work_trends(ctx: &AppContext) -> QueryObserver<Vec<RemoteWorkTrend>> {
  api_query(
    ctx,
    QueryKey::new("remote_work_trends"),
    ctx.queries.default_options(),
    |api| async move { api.get_remote_work_trends().await },
  )
}

pub fn hiring_trends(ctx: &AppContext) -> QueryObserver<Vec<HiringTrend>> {
  let days = ctx.config.dashboard.hiring_trend_days;
  api_query(
    ctx,
    QueryKey::with_params("hiring_trends", &days),
    ctx
      .queries
      .default_options()
      .with_stale_time(HIRING_TRENDS_STALE_TIME),
    move |api| async move { api.get_hiring_trends(days).await },
  )
}

pub fn salary_insights(ctx: &AppContext, query: SalaryQuery) -> QueryObserver<SalaryInsight> {
  api_query(
    ctx,
    QueryKey::with_params("salary_insights", &query),
    ctx.queries.default_options(),
    move |api| {
      let query = query.clone();
      async move { api.get_salary_insights(&query).await }
    },
  )
}

pub fn companies(ctx: &AppContext, page: PageParams) -> QueryObserver<Paginated<Company>> {
  api_query(
    ctx,
    QueryKey::with_params("companies", &page),
    ctx.queries.default_options(),
    move |api| async move { api.get_companies(page).await },
  )
}

pub fn skills(ctx: &AppContext, page: PageParams) -> QueryObserver<Paginated<SkillDemand>> {
  api_query(
    ctx,
    QueryKey::with_params("skills", &page),
    ctx.queries.default_options(),
    move |api| async move { api.get_skills(page).await },
  )
}
