//! Pattern miner for chronicle
//!
//! Batch analysis over a recent window of observations. Four independent
//! detectors group observations into typed patterns with confidence scores;
//! a single observation may contribute evidence to several patterns.
//!
//! Output ordering is deterministic for identical input (confidence
//! descending, then target document, then lowest evidence id), because the
//! gate auto-applies based on rank and threshold.

mod detectors;

use std::cmp::Ordering;

use chronicle_core::{MinerConfig, Pattern, QueryFilter, Result};
use chronicle_storage::Store;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub use detectors::normalize_error_signature;

/// The slice of history a mining pass looks at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    /// Restrict to one context, or mine across all of them
    pub context: Option<String>,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl Window {
    /// The trailing `days` days, all contexts.
    pub fn last_days(days: i64) -> Self {
        let until = Utc::now();
        Self { context: None, since: until - Duration::days(days), until }
    }

    #[must_use]
    pub fn in_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Detects patterns in windows of observations.
#[derive(Debug, Clone)]
pub struct PatternMiner {
    config: MinerConfig,
}

impl PatternMiner {
    pub fn new(config: MinerConfig) -> Self {
        Self { config }
    }

    /// Run all detectors over the window and return patterns in
    /// deterministic order.
    ///
    /// The window is fetched with a single statement, so a pass never sees
    /// a partially written record.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn detect_patterns(&self, store: &Store, window: &Window) -> Result<Vec<Pattern>> {
        let filter = QueryFilter {
            context: window.context.clone(),
            since: Some(window.since),
            until: Some(window.until),
            ..QueryFilter::default()
        };
        // scan, not query: the capped fetch would drop the oldest records
        // of a busy window and undercount pattern evidence.
        let observations = store.scan(&filter)?;

        let mut patterns = Vec::new();
        patterns.extend(detectors::repeated_files(&self.config, &observations));
        patterns.extend(detectors::new_features(&self.config, &observations));
        patterns.extend(detectors::decision_points(&self.config, &observations));
        patterns.extend(detectors::error_patterns(&self.config, &observations));

        patterns.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.target_document.cmp(&b.target_document))
                .then_with(|| a.first_evidence().cmp(&b.first_evidence()))
        });

        tracing::info!(
            window_observations = observations.len(),
            patterns = patterns.len(),
            "mining pass complete"
        );
        Ok(patterns)
    }
}
