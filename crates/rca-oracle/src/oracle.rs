//! Oracle contract and transports

use crate::error::OracleError;
use crate::request::OracleRequest;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// External free-text interpretation function
///
/// Output is untrusted: implementations return the raw response and
/// [`crate::OracleAdapter`] decides whether it may touch state.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Interpret one turn
    ///
    /// # Errors
    /// Returns [`OracleError`] on transport failure or unusable output
    async fn interpret(&self, request: &OracleRequest) -> Result<Value, OracleError>;

    /// Oracle name (for logging)
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Oracle + ?Sized> Oracle for Arc<T> {
    async fn interpret(&self, request: &OracleRequest) -> Result<Value, OracleError> {
        (**self).interpret(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Oracle reached over HTTP
///
/// The request is posted as JSON; the response body must be a JSON document.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    client: reqwest::Client,
    endpoint: String,
    bearer_token: Option<String>,
}

impl HttpOracle {
    /// Oracle at `endpoint`
    ///
    /// # Errors
    /// Returns [`OracleError::Config`] if the endpoint is not an http(s) URL
    pub fn new(endpoint: impl Into<String>) -> Result<Self, OracleError> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(OracleError::Config(format!(
                "endpoint must be an http(s) URL: {endpoint}"
            )));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            bearer_token: None,
        })
    }

    /// Builder: authenticate with a bearer token
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Configured endpoint
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn interpret(&self, request: &OracleRequest) -> Result<Value, OracleError> {
        let mut call = self.client.post(&self.endpoint).json(request);
        if let Some(token) = &self.bearer_token {
            call = call.bearer_auth(token);
        }
        let body = call.send().await?.error_for_status()?.text().await?;
        serde_json::from_str(&body).map_err(|e| OracleError::malformed(format!("body is not JSON: {e}")))
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Oracle replaying canned responses in order
///
/// Used by tests and offline CLI runs. Every request it receives is kept
/// for inspection.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    responses: Mutex<VecDeque<Result<Value, OracleError>>>,
    requests: Mutex<Vec<OracleRequest>>,
    delay: Option<Duration>,
}

impl ScriptedOracle {
    /// Oracle answering with `responses`, then [`OracleError::Exhausted`]
    #[must_use]
    pub fn new(responses: impl IntoIterator<Item = Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            ..Self::default()
        }
    }

    /// Load responses from a JSON array file
    ///
    /// # Errors
    /// Returns [`OracleError::Config`] if the file is unreadable or not an array
    pub async fn from_file(path: &Path) -> Result<Self, OracleError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| OracleError::Config(format!("{}: {e}", path.display())))?;
        let responses: Vec<Value> = serde_json::from_str(&text)
            .map_err(|e| OracleError::Config(format!("{}: expected a JSON array: {e}", path.display())))?;
        Ok(Self::new(responses))
    }

    /// Builder: wait before answering
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a response
    pub fn push(&self, response: Value) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queue a failure
    pub fn push_error(&self, error: OracleError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests.lock().clone()
    }

    /// Responses not yet served
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn interpret(&self, request: &OracleRequest) -> Result<Value, OracleError> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .pop_front()
            .unwrap_or(Err(OracleError::Exhausted))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rca_artifact::Stage;
    use serde_json::json;

    #[tokio::test]
    async fn scripted_replays_in_order() {
        let oracle = ScriptedOracle::new(vec![json!({"n": 1}), json!({"n": 2})]);
        let request = OracleRequest::new(Stage::Ideas, "hello");
        assert_eq!(oracle.interpret(&request).await.unwrap(), json!({"n": 1}));
        assert_eq!(oracle.interpret(&request).await.unwrap(), json!({"n": 2}));
        assert_eq!(oracle.interpret(&request).await, Err(OracleError::Exhausted));
        assert_eq!(oracle.requests().len(), 3);
    }

    #[tokio::test]
    async fn scripted_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.json");
        std::fs::write(&path, r#"[{"assistantMessage": "hi", "controlSignal": "done"}]"#).unwrap();
        let oracle = ScriptedOracle::from_file(&path).await.unwrap();
        assert_eq!(oracle.remaining(), 1);

        std::fs::write(&path, r#"{"not": "an array"}"#).unwrap();
        assert!(matches!(
            ScriptedOracle::from_file(&path).await,
            Err(OracleError::Config(_))
        ));
    }

    #[test]
    fn http_rejects_non_http_endpoint() {
        assert!(HttpOracle::new("ftp://example.org").is_err());
        let oracle = HttpOracle::new("https://oracle.example.org/v1/interpret").unwrap();
        assert_eq!(oracle.endpoint(), "https://oracle.example.org/v1/interpret");
    }
}
