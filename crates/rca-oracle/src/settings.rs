//! Oracle settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the adapter reaches and supervises the oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    /// HTTP endpoint; `None` means no live oracle is configured
    pub endpoint: Option<String>,
    /// Environment variable holding a bearer token
    pub token_env: Option<String>,
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Re-asks on malformed output (0 or 1)
    pub max_retries: u8,
    /// History turns forwarded with each request
    pub history_window: usize,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            token_env: None,
            timeout_ms: 20_000,
            max_retries: 1,
            history_window: crate::request::DEFAULT_HISTORY_WINDOW,
        }
    }
}

impl OracleSettings {
    /// Per-attempt timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Builder: set endpoint
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Builder: set timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builder: set retry count
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }
}
