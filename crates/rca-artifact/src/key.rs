//! Composite artifact keys
//!
//! Every artifact is addressed by the explicit tuple
//! `(owner, stage, kind, period)`; nothing is keyed by process memory.

use crate::stage::Stage;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Owner of an artifact (the student)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Create owner id
    ///
    /// # Errors
    /// Returns error if the id is blank
    pub fn new(id: impl Into<String>) -> Result<Self, KeyError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(KeyError::BlankOwner);
        }
        Ok(Self(id.trim().to_string()))
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Time period an artifact belongs to
///
/// Opaque non-blank token. [`PeriodKey::for_date`] produces the monthly
/// `YYYY-MM` form used by default.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodKey(String);

impl PeriodKey {
    /// Create period key
    ///
    /// # Errors
    /// Returns error if the key is blank or contains whitespace
    pub fn new(key: impl Into<String>) -> Result<Self, KeyError> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(KeyError::BlankPeriod);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(KeyError::MalformedPeriod(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Monthly period containing `date`
    #[must_use]
    pub fn for_date(date: NaiveDate) -> Self {
        Self(format!("{:04}-{:02}", date.year(), date.month()))
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PeriodKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of stored document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Working copy updated on every guided turn
    Draft,
    /// Validated artifact consumed by the next stage
    Final,
    /// Derived evaluation written together with the final artifact
    Evaluation,
}

impl ArtifactKind {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Draft => "draft",
            ArtifactKind::Final => "final",
            ArtifactKind::Evaluation => "evaluation",
        }
    }
}

impl Display for ArtifactKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a stored document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    /// Still being edited
    #[default]
    Draft,
    /// Passed the stage gate
    Validated,
}

/// Composite key `(owner, stage, kind, period)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactKey {
    /// Owner
    pub owner: OwnerId,
    /// Stage
    pub stage: Stage,
    /// Document kind
    pub kind: ArtifactKind,
    /// Period
    pub period: PeriodKey,
}

impl ArtifactKey {
    /// Create key
    #[inline]
    #[must_use]
    pub fn new(owner: OwnerId, stage: Stage, kind: ArtifactKind, period: PeriodKey) -> Self {
        Self {
            owner,
            stage,
            kind,
            period,
        }
    }

    /// Draft key for owner/stage/period
    #[inline]
    #[must_use]
    pub fn draft(owner: &OwnerId, stage: Stage, period: &PeriodKey) -> Self {
        Self::new(owner.clone(), stage, ArtifactKind::Draft, period.clone())
    }

    /// Final key for owner/stage/period
    #[inline]
    #[must_use]
    pub fn final_of(owner: &OwnerId, stage: Stage, period: &PeriodKey) -> Self {
        Self::new(owner.clone(), stage, ArtifactKind::Final, period.clone())
    }

    /// Evaluation key for owner/stage/period
    #[inline]
    #[must_use]
    pub fn evaluation(owner: &OwnerId, stage: Stage, period: &PeriodKey) -> Self {
        Self::new(owner.clone(), stage, ArtifactKind::Evaluation, period.clone())
    }

    /// Same key with a different kind
    #[inline]
    #[must_use]
    pub fn with_kind(&self, kind: ArtifactKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }

    /// Same key with a different stage
    #[inline]
    #[must_use]
    pub fn with_stage(&self, stage: Stage) -> Self {
        Self {
            stage,
            ..self.clone()
        }
    }

    /// Whether two keys name the same logical work, ignoring the period
    #[inline]
    #[must_use]
    pub fn same_lineage(&self, other: &Self) -> bool {
        self.owner == other.owner && self.stage == other.stage && self.kind == other.kind
    }
}

impl Display for ArtifactKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.owner,
            self.stage.slug(),
            self.kind,
            self.period
        )
    }
}

/// Key construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// Blank owner id
    #[error("owner id must not be blank")]
    BlankOwner,

    /// Blank period key
    #[error("period key must not be blank")]
    BlankPeriod,

    /// Period key with whitespace
    #[error("malformed period key: {0:?}")]
    MalformedPeriod(String),
}
