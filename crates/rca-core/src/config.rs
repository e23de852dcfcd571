//! Service configuration
//!
//! Loaded from TOML or YAML chosen by file extension. A missing file yields
//! the defaults.

use crate::error::RcaError;
use rca_composition::{FocusLimits, StrategyRegistry, TreeMergeStrategy};
use rca_gate::Thresholds;
use rca_oracle::OracleSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where artifacts are stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// JSON document holding every artifact
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("rca-store.json"),
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcaConfig {
    /// Stage minimums
    pub thresholds: Thresholds,
    /// Oracle transport and supervision
    pub oracle: OracleSettings,
    /// Artifact storage
    pub store: StoreSettings,
}

impl RcaConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With thresholds
    #[inline]
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// With oracle settings
    #[inline]
    #[must_use]
    pub fn with_oracle(mut self, oracle: OracleSettings) -> Self {
        self.oracle = oracle;
        self
    }

    /// With store path
    #[inline]
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.path = path.into();
        self
    }

    /// Load from `path`, or defaults if the file does not exist
    ///
    /// # Errors
    /// Returns [`RcaError::Config`] if the file cannot be read, does not
    /// parse, has an unknown extension, or fails [`RcaConfig::validate`]
    pub fn load(path: &Path) -> Result<Self, RcaError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(RcaError::Config(format!("{}: {e}", path.display()))),
        };
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text)?,
            Some("yaml" | "yml") => Self::from_yaml_str(&text)?,
            other => {
                return Err(RcaError::Config(format!(
                    "{}: unsupported config format {:?}",
                    path.display(),
                    other.unwrap_or("")
                )))
            }
        };
        config.validate()?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse TOML
    ///
    /// # Errors
    /// Returns [`RcaError::Config`] on parse failure
    pub fn from_toml_str(text: &str) -> Result<Self, RcaError> {
        toml::from_str(text).map_err(|e| RcaError::Config(e.to_string()))
    }

    /// Parse YAML
    ///
    /// # Errors
    /// Returns [`RcaError::Config`] on parse failure
    pub fn from_yaml_str(text: &str) -> Result<Self, RcaError> {
        serde_yaml::from_str(text).map_err(|e| RcaError::Config(e.to_string()))
    }

    /// Reject inconsistent settings
    ///
    /// # Errors
    /// Returns [`RcaError::Config`] naming the first inconsistency
    pub fn validate(&self) -> Result<(), RcaError> {
        self.thresholds.validate().map_err(RcaError::Config)?;
        if self.oracle.max_retries > 1 {
            return Err(RcaError::Config(format!(
                "oracle.max_retries must be 0 or 1, got {}",
                self.oracle.max_retries
            )));
        }
        if self.oracle.timeout_ms == 0 {
            return Err(RcaError::Config("oracle.timeout_ms must be positive".into()));
        }
        if self.oracle.history_window == 0 {
            return Err(RcaError::Config("oracle.history_window must be positive".into()));
        }
        Ok(())
    }

    /// Focus machine limits derived from the thresholds
    #[must_use]
    pub fn focus_limits(&self) -> FocusLimits {
        FocusLimits {
            min_main_causes: self.thresholds.min_main_causes,
            min_sub_causes: self.thresholds.min_sub_causes,
            close_depth: self.thresholds.close_depth,
        }
    }

    /// Merge registry honouring the configured why bound
    #[must_use]
    pub fn registry(&self) -> StrategyRegistry {
        StrategyRegistry::new(TreeMergeStrategy::new(self.thresholds.max_whys))
    }
}
