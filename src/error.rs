use thiserror::Error;

/// Failures surfaced by the search, selection and category layers.
///
/// Every variant propagates to the caller untouched; nothing below the UI
/// swallows or substitutes data on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
  #[error("YouTube API key is not configured")]
  MissingCredential,

  #[error("Invalid YouTube API request parameters")]
  InvalidRequest,

  #[error("YouTube API quota exceeded or invalid API key")]
  QuotaOrAuth,

  #[error("YouTube API request timeout")]
  RequestTimeout,

  #[error("YouTube API error: {0}")]
  Upstream(String),

  /// Raised by callers that treat an empty final result set as terminal.
  #[error("No videos found for {0}")]
  NoResults(String),
}

impl SearchError {
  /// Map a non-success HTTP status onto the error taxonomy.
  pub fn from_status(status: u16, body: &str) -> Self {
    match status {
      400 => SearchError::InvalidRequest,
      403 => SearchError::QuotaOrAuth,
      _ => SearchError::Upstream(format!("HTTP {}: {}", status, upstream_message(body))),
    }
  }
}

/// Pull `error.message` out of a Google API error body, falling back to the raw text.
fn upstream_message(body: &str) -> String {
  serde_json::from_str::<serde_json::Value>(body)
    .ok()
    .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(str::to_string))
    .unwrap_or_else(|| body.trim().to_string())
}
