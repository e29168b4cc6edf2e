use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PatternKind;

/// Terminal outcome of proposing a pattern.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    /// Validated and written to the target document
    Applied,
    /// Below the auto-apply threshold; waiting for human review
    Queued,
    /// Failed validation; `reason` explains why
    Rejected,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Queued => "queued",
            Self::Rejected => "rejected",
        }
    }
}

/// The outcome of attempting to apply a pattern to a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub pattern_kind: PatternKind,
    pub target_document: String,
    /// The rendered fragment the gate validated (and possibly wrote)
    pub fragment: String,
    pub confidence: f64,
    pub evidence: Vec<i64>,
    pub status: UpdateStatus,
    /// Set when rejected (validation failure) or queued (threshold note)
    pub reason: Option<String>,
}

/// A queued update persisted for human review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedUpdate {
    pub id: i64,
    pub pattern_kind: PatternKind,
    pub target_document: String,
    pub fragment: String,
    pub confidence: f64,
    pub evidence: Vec<i64>,
    pub created_at: DateTime<Utc>,
}
