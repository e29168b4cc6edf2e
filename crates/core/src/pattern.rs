use serde::{Deserialize, Serialize};

/// Kind of pattern the miner can detect
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// The same file was touched repeatedly inside the window
    RepeatedFile,
    /// Observations whose text suggests feature work, grouped per context
    NewFeature,
    /// An explicit decision observation
    DecisionPoint,
    /// The same normalized error signature recurred inside the window
    ErrorPattern,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RepeatedFile => "repeated_file",
            Self::NewFeature => "new_feature",
            Self::DecisionPoint => "decision_point",
            Self::ErrorPattern => "error_pattern",
        }
    }
}

impl std::str::FromStr for PatternKind {
    type Err = crate::ChronicleError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "repeated_file" => Ok(Self::RepeatedFile),
            "new_feature" => Ok(Self::NewFeature),
            "decision_point" => Ok(Self::DecisionPoint),
            "error_pattern" => Ok(Self::ErrorPattern),
            other => Err(crate::ChronicleError::validation(format!(
                "unknown pattern kind: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A derived grouping of observations, suggesting a documentation update.
///
/// Patterns are not persisted; they exist between a mining pass and the
/// gate's decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub kind: PatternKind,
    /// In [0, 1]. Evidence of activity, not proof of importance.
    pub confidence: f64,
    /// Supporting observation ids, ascending
    pub evidence: Vec<i64>,
    /// Rendered markdown fragment suitable for the target document
    pub proposed_text: String,
    /// Logical document name; the gate resolves it to a path
    pub target_document: String,
}

impl Pattern {
    /// Lowest evidence id, used as the final determinism tie-breaker.
    pub fn first_evidence(&self) -> i64 {
        self.evidence.first().copied().unwrap_or(i64::MAX)
    }
}
