//! Stage key and status enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the six fixed stages of the lead-intake flow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    /// The lead record exists server-side.
    RecordCreated,
    /// Look for existing leads with the same company, email or phone.
    DuplicateCheck,
    /// Fill in firmographic fields from third-party sources.
    Enrichment,
    /// Verify contact details and company data.
    Validation,
    /// Compute fit, intent and potential scores.
    Scoring,
    /// Hand the lead to an owner. Requires human input.
    Assignment,
}

impl StageKey {
    /// All stages in execution order.
    pub const ALL: [Self; 6] = [
        Self::RecordCreated,
        Self::DuplicateCheck,
        Self::Enrichment,
        Self::Validation,
        Self::Scoring,
        Self::Assignment,
    ];

    /// Zero-based position of the stage in the flow.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::RecordCreated => 0,
            Self::DuplicateCheck => 1,
            Self::Enrichment => 2,
            Self::Validation => 3,
            Self::Scoring => 4,
            Self::Assignment => 5,
        }
    }

    /// The stage before this one, if any.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::RecordCreated => None,
            Self::DuplicateCheck => Some(Self::RecordCreated),
            Self::Enrichment => Some(Self::DuplicateCheck),
            Self::Validation => Some(Self::Enrichment),
            Self::Scoring => Some(Self::Validation),
            Self::Assignment => Some(Self::Scoring),
        }
    }

    /// The stage after this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::RecordCreated => Some(Self::DuplicateCheck),
            Self::DuplicateCheck => Some(Self::Enrichment),
            Self::Enrichment => Some(Self::Validation),
            Self::Validation => Some(Self::Scoring),
            Self::Scoring => Some(Self::Assignment),
            Self::Assignment => None,
        }
    }

    /// Human-readable title shown on the stage card.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::RecordCreated => "Lead Record Created",
            Self::DuplicateCheck => "Duplicate Check",
            Self::Enrichment => "Data Enrichment",
            Self::Validation => "Data Validation",
            Self::Scoring => "Lead Scoring",
            Self::Assignment => "Lead Assignment",
        }
    }

    /// Static message recorded when the stage's backend call fails.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::RecordCreated => "Failed to create lead record",
            Self::DuplicateCheck => "Failed to check for duplicates",
            Self::Enrichment => "Failed to enrich lead data",
            Self::Validation => "Failed to validate lead data",
            Self::Scoring => "Failed to calculate lead score",
            Self::Assignment => "Failed to assign lead",
        }
    }

    /// Whether the stage can only be completed by a human.
    #[must_use]
    pub const fn is_interactive(self) -> bool {
        matches!(self, Self::Assignment)
    }

    /// Wire name of the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RecordCreated => "record_created",
            Self::DuplicateCheck => "duplicate_check",
            Self::Enrichment => "enrichment",
            Self::Validation => "validation",
            Self::Scoring => "scoring",
            Self::Assignment => "assignment",
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown stage '{s}'"))
    }
}

/// The status of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage has not started.
    Pending,
    /// Stage is currently running.
    Running,
    /// Stage completed successfully.
    Success,
    /// Stage completed with an ambiguous or partial result.
    Warning,
    /// Stage failed.
    Error,
    /// Stage is waiting for human input.
    Manual,
}

impl Default for StageStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status lets the next stage start.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Warning | Self::Error)
    }

    /// Returns true if the status can be forced to success by a manual override.
    #[must_use]
    pub fn is_overridable(&self) -> bool {
        matches!(self, Self::Warning | Self::Error)
    }

    /// Returns true if the stage still needs operator attention.
    #[must_use]
    pub fn needs_attention(&self) -> bool {
        matches!(self, Self::Warning | Self::Error | Self::Manual)
    }
}
