//! Stage enumeration and pipeline dependency chain
//!
//! The methodology runs through seven stages, 0 through 6. Each stage has a
//! single declared upstream dependency whose validated artifact gates it.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// One step of the guided methodology
///
/// Serialized as its integer index so stored documents stay compact and
/// stable across renames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Stage {
    /// Stage 0: sector, products and process focus
    CaseContext,
    /// Stage 1: baseline productivity
    Productivity,
    /// Stage 2: internal/external quadrant analysis (FODA)
    Quadrants,
    /// Stage 3: problem statement and brainstormed ideas
    Ideas,
    /// Stage 4: Ishikawa cause tree with why-chains
    CauseTree,
    /// Stage 5: 80/20 prioritization
    Prioritization,
    /// Stage 6: objectives linked to critical roots
    Objectives,
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; 7] = [
        Stage::CaseContext,
        Stage::Productivity,
        Stage::Quadrants,
        Stage::Ideas,
        Stage::CauseTree,
        Stage::Prioritization,
        Stage::Objectives,
    ];

    /// Numeric index (0..=6)
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Stage::CaseContext => 0,
            Stage::Productivity => 1,
            Stage::Quadrants => 2,
            Stage::Ideas => 3,
            Stage::CauseTree => 4,
            Stage::Prioritization => 5,
            Stage::Objectives => 6,
        }
    }

    /// Stage from index
    #[inline]
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Stage whose validated artifact gates this one
    ///
    /// Stage 0 has no upstream; every other stage depends on the stage
    /// immediately before it.
    #[inline]
    #[must_use]
    pub fn upstream(self) -> Option<Self> {
        match self.index() {
            0 => None,
            i => Self::from_index(i - 1),
        }
    }

    /// Stage that this one unlocks once validated
    #[inline]
    #[must_use]
    pub fn downstream(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// Stable machine name
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Stage::CaseContext => "case_context",
            Stage::Productivity => "productivity",
            Stage::Quadrants => "quadrants",
            Stage::Ideas => "ideas",
            Stage::CauseTree => "cause_tree",
            Stage::Prioritization => "prioritization",
            Stage::Objectives => "objectives",
        }
    }

    /// Human-readable title
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Stage::CaseContext => "Case context",
            Stage::Productivity => "Baseline productivity",
            Stage::Quadrants => "FODA quadrants",
            Stage::Ideas => "Idea brainstorm",
            Stage::CauseTree => "Ishikawa cause tree",
            Stage::Prioritization => "Pareto prioritization",
            Stage::Objectives => "Objectives",
        }
    }

    /// Whether draft writes deep-merge structure instead of replacing fields
    #[inline]
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Stage::CauseTree)
    }

    /// Iterate over all stages in order
    pub fn iter() -> impl Iterator<Item = Stage> {
        Self::ALL.into_iter()
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} ({})", self.index(), self.title())
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> Self {
        stage.index()
    }
}

impl TryFrom<u8> for Stage {
    type Error = StageIndexError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Stage::from_index(value).ok_or(StageIndexError(value))
    }
}

impl std::str::FromStr for Stage {
    type Err = StageIndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(index) = s.parse::<u8>() {
            return Stage::try_from(index);
        }
        Stage::iter()
            .find(|stage| stage.slug() == s)
            .ok_or(StageIndexError(u8::MAX))
    }
}

/// Stage index outside 0..=6
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage index: {0} (expected 0..=6)")]
pub struct StageIndexError(pub u8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_chain_is_linear() {
        assert_eq!(Stage::CaseContext.upstream(), None);
        assert_eq!(Stage::Productivity.upstream(), Some(Stage::CaseContext));
        assert_eq!(Stage::Objectives.upstream(), Some(Stage::Prioritization));
        assert_eq!(Stage::Objectives.downstream(), None);
    }

    #[test]
    fn stage_serializes_as_index() {
        let json = serde_json::to_string(&Stage::CauseTree).unwrap();
        assert_eq!(json, "4");
        let back: Stage = serde_json::from_str("5").unwrap();
        assert_eq!(back, Stage::Prioritization);
    }

    #[test]
    fn stage_rejects_out_of_range() {
        assert!(serde_json::from_str::<Stage>("7").is_err());
        assert_eq!(Stage::try_from(9), Err(StageIndexError(9)));
    }

    #[test]
    fn stage_parses_slug_or_index() {
        assert_eq!("cause_tree".parse::<Stage>().unwrap(), Stage::CauseTree);
        assert_eq!("2".parse::<Stage>().unwrap(), Stage::Quadrants);
        assert!("unknown".parse::<Stage>().is_err());
    }

    #[test]
    fn only_cause_tree_is_structured() {
        let structured: Vec<_> = Stage::iter().filter(|s| s.is_structured()).collect();
        assert_eq!(structured, vec![Stage::CauseTree]);
    }
}
