//! Error types for the character API client.

/// Errors returned by [`ApiClient`](super::client::ApiClient) operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  /// Non-success HTTP status
  #[error("Failed to fetch {resource}: {status_text}")]
  RemoteRequest {
    resource: &'static str,
    status: u16,
    status_text: String,
  },

  /// The remote answered 404 for the requested entity
  #[error("{resource} not found")]
  NotFound { resource: &'static str },

  /// Body was not valid JSON of the expected shape
  #[error("Failed to parse {resource}: {source}")]
  Parse {
    resource: &'static str,
    #[source]
    source: serde_json::Error,
  },

  /// Request could not be sent or completed
  #[error("Network error: {0}")]
  Network(#[from] reqwest::Error),

  #[error("Invalid API base URL {url}: {reason}")]
  InvalidUrl { url: String, reason: String },
}

impl ApiError {
  /// Whether the error came from the remote saying the entity does not exist.
  #[cfg(test)]
  pub fn is_not_found(&self) -> bool {
    matches!(self, ApiError::NotFound { .. })
  }
}

pub type Result<T> = std::result::Result<T, ApiError>;
