mod analytics;
mod dashboard;
mod job_detail;
mod job_list;
mod queries;

pub use analytics::AnalyticsView;
pub use dashboard::DashboardView;
pub use job_detail::JobDetailView;
pub use job_list::JobListView;
