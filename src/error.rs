// src/error.rs

use std::time::Duration;

/// Error taxonomy for every upstream interaction in the SDK.
///
/// The enum is `Clone` on purpose: deduplicated callers share the outcome
/// of a single in-flight fetch, failures included, so the error must be
/// shareable by value.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AssetError {
    /// Network-level failure (connect, DNS, broken body). Retryable.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status other than 429. 5xx is retryable, 4xx is not.
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Explicit rate-limit signal (HTTP 429 or an upstream message that
    /// names it). Never retried; routed to the fallback-value path instead.
    #[error("upstream rate limited: {0}")]
    RateLimited(String),

    /// The operation did not resolve within its budget. Counts as one
    /// retry attempt.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The upstream answered but the payload did not have the expected
    /// shape. Treated as "no data" by aggregation, never a crash.
    #[error("malformed upstream payload: {0}")]
    Malformed(String),

    /// Input rejected at the boundary before any I/O was attempted.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl AssetError {
    /// Whether the retry loop should try again after this error.
    ///
    /// Rate limits are deliberately excluded: a 429 goes straight to the
    /// per-token fallback value, retrying would only dig the hole deeper.
    pub fn is_retryable(&self) -> bool {
        match self {
            AssetError::Transport(_) | AssetError::Timeout(_) => true,
            AssetError::Status { status, .. } => *status >= 500,
            AssetError::RateLimited(_)
            | AssetError::Malformed(_)
            | AssetError::Validation(_) => false,
        }
    }

    /// Rate-limit detection, including upstreams that bury the 429 inside
    /// an error message instead of the status line.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            AssetError::RateLimited(_) => true,
            AssetError::Status { status: 429, .. } => true,
            other => {
                let msg = other.to_string().to_lowercase();
                msg.contains("429") || msg.contains("rate limit")
            }
        }
    }
}

impl From<reqwest::Error> for AssetError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AssetError::Timeout(Duration::from_secs(0))
        } else if let Some(status) = err.status() {
            if status.as_u16() == 429 {
                AssetError::RateLimited(err.to_string())
            } else {
                AssetError::Status {
                    status: status.as_u16(),
                    body: err.to_string(),
                }
            }
        } else {
            AssetError::Transport(err.to_string())
        }
    }
}

pub type Result<T, E = AssetError> = std::result::Result<T, E>;
