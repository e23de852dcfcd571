//! Trusted boundary around the oracle
//!
//! [`OracleAdapter`] is the only path from oracle output to state. Every
//! response is checked against the proposal schema, parsed, and shape
//! checked for the active stage. Anything that fails falls back to a
//! clarification proposal that changes nothing.

use crate::error::OracleError;
use crate::oracle::Oracle;
use crate::proposal::{proposal_schema, Proposal};
use crate::request::OracleRequest;
use crate::settings::OracleSettings;
use jsonschema::JSONSchema;
use rca_artifact::Stage;
use rca_composition::check_shape;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Control fields owned by the focus machine, never by the oracle
const TREE_CONTROL_FIELDS: [&str; 2] = ["cursor", "pendingBranchSwitch"];

/// Result of one adapter call
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Proposal to act on (the clarification fallback on failure)
    pub proposal: Proposal,
    /// Calls made to the oracle
    pub attempts: u32,
    /// Why the fallback was used
    pub fallback: Option<OracleError>,
}

impl Outcome {
    /// Whether the proposal is the clarification fallback
    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Schema-checking, retrying wrapper around an [`Oracle`]
pub struct OracleAdapter<O> {
    oracle: O,
    schema: Value,
    validator: JSONSchema,
    timeout: Duration,
    max_retries: u32,
}

impl<O> fmt::Debug for OracleAdapter<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleAdapter")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl<O: Oracle> OracleAdapter<O> {
    /// Wrap `oracle` with the given settings
    ///
    /// # Errors
    /// Returns [`OracleError::Config`] if the settings are out of range or
    /// the proposal schema does not compile
    pub fn new(oracle: O, settings: &OracleSettings) -> Result<Self, OracleError> {
        if settings.timeout_ms == 0 {
            return Err(OracleError::Config("timeout_ms must be positive".into()));
        }
        if settings.max_retries > 1 {
            return Err(OracleError::Config(format!(
                "max_retries must be 0 or 1, got {}",
                settings.max_retries
            )));
        }
        let schema = proposal_schema()?;
        let validator = JSONSchema::compile(&schema)
            .map_err(|e| OracleError::Config(format!("proposal schema: {e}")))?;
        Ok(Self {
            oracle,
            schema,
            validator,
            timeout: settings.timeout(),
            max_retries: u32::from(settings.max_retries),
        })
    }

    /// Wrapped oracle
    #[inline]
    #[must_use]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Schema attached to every request
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Ask the oracle for a proposal
    ///
    /// Never fails: transport errors and timeouts fall back immediately,
    /// malformed output is re-asked up to the retry limit first.
    pub async fn propose(&self, request: OracleRequest) -> Outcome {
        let request = request.with_schema(self.schema.clone());
        let stage = request.stage;
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.attempt(&request).await {
                Ok(proposal) => {
                    info!(
                        "oracle {} accepted for {} after {} attempt(s)",
                        self.oracle.name(),
                        stage.slug(),
                        attempts
                    );
                    return Outcome {
                        proposal,
                        attempts,
                        fallback: None,
                    };
                }
                Err(e) if e.is_retryable() && attempts <= self.max_retries => {
                    warn!("oracle attempt {} for {} rejected, retrying: {}", attempts, stage.slug(), e);
                }
                Err(e) => {
                    warn!("oracle fallback for {} after {} attempt(s): {}", stage.slug(), attempts, e);
                    return Outcome {
                        proposal: Proposal::clarification(stage),
                        attempts,
                        fallback: Some(e),
                    };
                }
            }
        }
    }

    async fn attempt(&self, request: &OracleRequest) -> Result<Proposal, OracleError> {
        let raw = tokio::time::timeout(self.timeout, self.oracle.interpret(request))
            .await
            .map_err(|_| OracleError::Timeout(self.timeout))??;
        debug!("oracle {} answered for {}", self.oracle.name(), request.stage.slug());
        self.check(request.stage, raw)
    }

    /// Validate a raw response and turn it into a proposal
    ///
    /// # Errors
    /// Returns [`OracleError::Malformed`] describing the first problems found
    pub fn check(&self, stage: Stage, raw: Value) -> Result<Proposal, OracleError> {
        if let Err(errors) = self.validator.validate(&raw) {
            let problems: Vec<String> = errors.take(3).map(|e| e.to_string()).collect();
            return Err(OracleError::malformed(problems.join("; ")));
        }
        let mut proposal: Proposal =
            serde_json::from_value(raw).map_err(|e| OracleError::malformed(e.to_string()))?;
        if proposal.assistant_message.trim().is_empty() {
            return Err(OracleError::malformed("assistantMessage is blank"));
        }
        if stage == Stage::CauseTree {
            for field in TREE_CONTROL_FIELDS {
                if proposal.patch.remove(field).is_some() {
                    debug!("dropped oracle-supplied {} from cause tree patch", field);
                }
            }
        }
        check_shape(stage, &proposal.patch_value()).map_err(|e| OracleError::malformed(e.to_string()))?;
        Ok(proposal)
    }
}
