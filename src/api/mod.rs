pub mod client;
pub mod error;
pub mod types;

use futures::future::BoxFuture;

pub use client::ApiClient;
pub use error::ApiResult;
pub use types::*;

/// Anything that can serve pages of job postings.
///
/// The job list view depends on this instead of [`ApiClient`] so it can be
/// driven by a fixture.
pub trait JobSource: Send + Sync + 'static {
  fn jobs(&self, query: JobsQuery) -> BoxFuture<'static, ApiResult<Paginated<JobPosting>>>;

  fn job(&self, id: String) -> BoxFuture<'static, ApiResult<JobPosting>>;
}

impl JobSource for ApiClient {
  fn jobs(&self, query: JobsQuery) -> BoxFuture<'static, ApiResult<Paginated<JobPosting>>> {
    let api = self.clone();
    Box::pin(async move { api.get_jobs(&query).await })
  }

  fn job(&self, id: String) -> BoxFuture<'static, ApiResult<JobPosting>> {
    let api = self.clone();
    Box::pin(async move { api.get_job(&id).await })
  }
}
