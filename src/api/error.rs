use thiserror::Error;

use crate::query::{QueryError, QueryErrorKind};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failure of a single API request.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("invalid API base URL {url:?}: {source}")]
  InvalidBaseUrl {
    url: String,
    #[source]
    source: url::ParseError,
  },

  #[error("request to {url} timed out")]
  Timeout { url: String },

  #[error("could not reach {url}: {source}")]
  Transport {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("{url} returned HTTP {status}")]
  HttpStatus { url: String, status: u16, body: String },

  #[error("unexpected response from {url}: {source}")]
  Decode {
    url: String,
    #[source]
    source: reqwest::Error,
  },
}

impl ApiError {
  /// Classify a reqwest failure for `url`.
  pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
    let url = url.into();
    if source.is_timeout() {
      ApiError::Timeout { url }
    } else if source.is_decode() {
      ApiError::Decode { url, source }
    } else {
      ApiError::Transport { url, source }
    }
  }
}

impl From<ApiError> for QueryError {
  fn from(err: ApiError) -> Self {
    let kind = match &err {
      ApiError::Timeout { .. } => QueryErrorKind::Timeout,
      ApiError::Transport { .. } => QueryErrorKind::Transport,
      ApiError::HttpStatus { status, .. } => QueryErrorKind::HttpStatus(*status),
      ApiError::Decode { .. } => QueryErrorKind::Decode,
      ApiError::InvalidBaseUrl { .. } => QueryErrorKind::Other,
    };
    QueryError::new(kind, err.to_string())
  }
}
