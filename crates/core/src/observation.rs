use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChronicleError, Result};

/// Kind of activity an observation records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    /// A file was created, modified or deleted
    FileChange,
    /// A tool or script was invoked
    ToolUsage,
    /// A session milestone (start, end, checkpoint)
    SessionEvent,
    /// Output of a periodic health audit
    HealthAudit,
    /// An explicit, author-asserted decision
    Decision,
    /// A detected error or failure
    Error,
}

impl ObservationKind {
    pub const ALL: [Self; 6] = [
        Self::FileChange,
        Self::ToolUsage,
        Self::SessionEvent,
        Self::HealthAudit,
        Self::Decision,
        Self::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileChange => "file_change",
            Self::ToolUsage => "tool_usage",
            Self::SessionEvent => "session_event",
            Self::HealthAudit => "health_audit",
            Self::Decision => "decision",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for ObservationKind {
    type Err = ChronicleError;

    /// Unknown kinds are a caller error, not a default. Capture must reject
    /// them rather than coerce.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "file_change" => Ok(Self::FileChange),
            "tool_usage" => Ok(Self::ToolUsage),
            "session_event" => Ok(Self::SessionEvent),
            "health_audit" => Ok(Self::HealthAudit),
            "decision" => Ok(Self::Decision),
            "error" => Ok(Self::Error),
            other => Err(ChronicleError::validation(format!(
                "unknown observation kind: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for ObservationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable captured fact about development activity.
///
/// Observations are append-only: corrections are new observations, and `id`
/// order is the canonical recency order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Monotonically increasing primary key
    pub id: i64,
    /// Capture time, UTC
    pub timestamp: DateTime<Utc>,
    /// Workstream label, configured per project (free-form)
    pub context: String,
    pub kind: ObservationKind,
    /// Short human-readable summary (~50 tokens), always present
    pub summary: String,
    /// Longer payload, only surfaced by the detail view
    pub detail: Option<String>,
    /// File paths touched or referenced, ordered, may be empty
    pub related_paths: Vec<String>,
    /// Session this observation belongs to, if captured inside one
    pub session_id: Option<i64>,
}

/// Input to `capture`: everything except the store-assigned id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationDraft {
    pub context: String,
    pub kind: ObservationKind,
    pub summary: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub related_paths: Vec<String>,
    #[serde(default)]
    pub session_id: Option<i64>,
}

impl ObservationDraft {
    pub fn new(context: impl Into<String>, kind: ObservationKind, summary: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            kind,
            summary: summary.into(),
            detail: None,
            related_paths: Vec::new(),
            session_id: None,
        }
    }

    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        if !self.related_paths.contains(&path) {
            self.related_paths.push(path);
        }
        self
    }

    #[must_use]
    pub fn session(mut self, session_id: i64) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// Filter for `query`. All fields are optional and combine with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryFilter {
    pub context: Option<String>,
    pub kind: Option<ObservationKind>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Case-insensitive substring match over summary and detail
    pub text: Option<String>,
}

impl QueryFilter {
    pub fn is_empty(&self) -> bool {
        self.context.is_none()
            && self.kind.is_none()
            && self.since.is_none()
            && self.until.is_none()
            && self.text.is_none()
    }
}

/// Store-level statistics, surfaced by `stats()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total: u64,
    /// (context, count) pairs, sorted by context
    pub by_context: Vec<(String, u64)>,
    /// (kind, count) pairs, sorted by kind name
    pub by_kind: Vec<(String, u64)>,
    /// Oldest and newest observation timestamps, None when empty
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub size_on_disk_bytes: u64,
}
