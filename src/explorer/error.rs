use serde_json::Value;

/// Failure of a single explorer request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExplorerError {
    /// The explorer throttled the request.
    #[error("Rate limited: {0}")]
    RateLimited(String),
    /// The explorer has no data for the request, e.g. an unverified contract.
    #[error("Not found: {0}")]
    NotFound(String),
    /// The request never got a response (connection, timeout).
    #[error("Transport error: {0}")]
    Transient(String),
    /// Any other rejection; retrying will not help.
    #[error("Explorer error: {0}")]
    Fatal(String),
    #[error("Malformed explorer response: {0}")]
    Decode(String),
    #[error("Request cancelled")]
    Cancelled,
}

impl ExplorerError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Transient(_))
    }

    /// Derives the error for an envelope with `status: "0"`.
    pub fn from_upstream(message: &str, result: &Value) -> Self {
        let detail = match result {
            Value::String(text) if !text.is_empty() => text.clone(),
            Value::String(_) | Value::Null => message.to_string(),
            other => format!("{message}: {other}"),
        };
        let haystack = format!("{message} {detail}").to_lowercase();

        if haystack.contains("rate limit") {
            Self::RateLimited(detail)
        } else if ["not verified", "no data found", "no transactions found", "no records found"]
            .iter()
            .any(|needle| haystack.contains(needle))
        {
            Self::NotFound(detail)
        } else {
            Self::Fatal(detail)
        }
    }
}

impl From<reqwest::Error> for ExplorerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
