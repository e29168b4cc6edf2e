//! Tuning knobs for the miner and the update gate.
//!
//! Thresholds and confidence formulas are policy, not law: everything here
//! can be tuned without touching detection logic, either in code or through
//! `CHRONICLE_*` environment variables.

use serde::{Deserialize, Serialize};

/// Parse an environment variable with a default fallback.
///
/// - If the variable is not set: returns `default` silently (expected case).
/// - If the variable is set but cannot be parsed: logs a warning and returns
///   `default`, so a typo in an env var never changes mining behavior
///   silently.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    match std::env::var(var) {
        Ok(v) => match v.parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        Err(_) => default,
    }
}

/// Per-detector thresholds and confidence formulas for the pattern miner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerConfig {
    /// Minimum touches of one path inside the window for `RepeatedFile`
    pub min_touches: usize,
    /// Touch count at which `RepeatedFile` confidence saturates
    pub repeated_file_saturation: f64,
    /// Confidence cap for `RepeatedFile` (churn is not importance)
    pub repeated_file_max: f64,
    /// Lower-case keywords that mark an observation as feature work
    pub feature_keywords: Vec<String>,
    /// Fixed confidence for `NewFeature` patterns
    pub feature_confidence: f64,
    /// Fixed confidence for `DecisionPoint` patterns (explicit, not inferred)
    pub decision_confidence: f64,
    /// Minimum recurrences of one error signature for `ErrorPattern`
    pub min_error_recurrence: usize,
    /// Recurrence count at which `ErrorPattern` confidence saturates
    pub error_saturation: f64,
    /// Confidence cap for `ErrorPattern`
    pub error_max: f64,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            min_touches: 2,
            repeated_file_saturation: 10.0,
            repeated_file_max: 0.9,
            feature_keywords: ["add", "create", "implement", "new"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            feature_confidence: 0.7,
            decision_confidence: 0.9,
            min_error_recurrence: 2,
            error_saturation: 5.0,
            error_max: 0.95,
        }
    }
}

impl MinerConfig {
    /// Defaults overridden by `CHRONICLE_MINER_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let feature_keywords = match std::env::var("CHRONICLE_MINER_FEATURE_KEYWORDS") {
            Ok(v) if !v.trim().is_empty() => v
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => defaults.feature_keywords,
        };
        Self {
            min_touches: env_parse_with_default("CHRONICLE_MINER_MIN_TOUCHES", defaults.min_touches),
            repeated_file_saturation: env_parse_with_default(
                "CHRONICLE_MINER_REPEATED_FILE_SATURATION",
                defaults.repeated_file_saturation,
            ),
            repeated_file_max: env_parse_with_default(
                "CHRONICLE_MINER_REPEATED_FILE_MAX",
                defaults.repeated_file_max,
            ),
            feature_keywords,
            feature_confidence: env_parse_with_default(
                "CHRONICLE_MINER_FEATURE_CONFIDENCE",
                defaults.feature_confidence,
            ),
            decision_confidence: env_parse_with_default(
                "CHRONICLE_MINER_DECISION_CONFIDENCE",
                defaults.decision_confidence,
            ),
            min_error_recurrence: env_parse_with_default(
                "CHRONICLE_MINER_MIN_ERROR_RECURRENCE",
                defaults.min_error_recurrence,
            ),
            error_saturation: env_parse_with_default(
                "CHRONICLE_MINER_ERROR_SATURATION",
                defaults.error_saturation,
            ),
            error_max: env_parse_with_default("CHRONICLE_MINER_ERROR_MAX", defaults.error_max),
        }
    }
}

/// Policy for the update gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Confidence at or above which a valid update is written without review
    pub auto_apply_threshold: f64,
    /// Maximum fragment lines per document unless overridden below
    pub default_line_budget: usize,
    /// Per-document line budget overrides, (logical name, budget)
    pub line_budgets: Vec<(String, usize)>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            auto_apply_threshold: 0.8,
            default_line_budget: 20,
            line_budgets: Vec::new(),
        }
    }
}

impl GateConfig {
    /// Defaults overridden by `CHRONICLE_GATE_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            auto_apply_threshold: env_parse_with_default(
                "CHRONICLE_GATE_AUTO_APPLY_THRESHOLD",
                defaults.auto_apply_threshold,
            ),
            default_line_budget: env_parse_with_default(
                "CHRONICLE_GATE_LINE_BUDGET",
                defaults.default_line_budget,
            ),
            line_budgets: Vec::new(),
        }
    }

    /// Line budget for a logical document name.
    pub fn line_budget_for(&self, target_document: &str) -> usize {
        self.line_budgets
            .iter()
            .find(|(name, _)| name == target_document)
            .map_or(self.default_line_budget, |(_, budget)| *budget)
    }
}
