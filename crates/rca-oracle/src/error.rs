//! Error types for the oracle boundary
//!
//! None of these escape [`crate::OracleAdapter`]; the adapter turns every
//! one of them into a clarification fallback.

use std::time::Duration;

/// Errors raised while obtaining or checking an oracle response
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    /// The oracle could not be reached or answered with an error status
    #[error("oracle transport error: {0}")]
    Transport(String),

    /// The oracle did not answer in time
    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),

    /// The response failed schema or content checks
    #[error("malformed oracle response: {0}")]
    Malformed(String),

    /// A scripted oracle ran out of responses
    #[error("scripted oracle exhausted")]
    Exhausted,

    /// Oracle settings are unusable
    #[error("invalid oracle configuration: {0}")]
    Config(String),
}

impl OracleError {
    /// Create malformed-response error
    #[inline]
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Whether a second attempt may help
    ///
    /// Only malformed output is retried; transport failures and timeouts
    /// fall back immediately.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl From<reqwest::Error> for OracleError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
