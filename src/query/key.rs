use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Identity of a cache slot: a query name plus its serialized parameters.
///
/// Two keys are equal when both the name and the serialized parameters are
/// equal, so structurally equal parameter values always share one entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey {
  name: &'static str,
  params: String,
}

impl QueryKey {
  /// Key for a query that takes no parameters.
  pub fn new(name: &'static str) -> Self {
    Self {
      name,
      params: String::new(),
    }
  }

  /// Key for a query with parameters.
  ///
  /// Parameters are serialized to JSON; field order follows the declaration
  /// order of the parameter type, which keeps the encoding stable.
  pub fn with_params<P: Serialize + ?Sized>(name: &'static str, params: &P) -> Self {
    let params = match serde_json::to_string(params) {
      Ok(json) => json,
      Err(e) => {
        warn!(query = name, error = %e, "query params are not serializable");
        format!("<unserializable:{}>", e)
      }
    };
    Self { name, params }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.params.is_empty() {
      f.write_str(self.name)
    } else {
      write!(f, "{}{}", self.name, self.params)
    }
  }
}
