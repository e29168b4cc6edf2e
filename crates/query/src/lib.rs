//! Disclosure engine for chronicle
//!
//! Three fixed-granularity read views over the observation store, each with
//! a declared per-result token budget so token-constrained consumers can
//! choose verbosity deliberately:
//!
//! - `search`: id + context + summary (~50 tokens/result)
//! - `timeline`: adds timestamp, kind, paths and nearby relationships
//!   (~200 tokens/result)
//! - `detail`: the full record (~500 tokens)

mod budget;

use chronicle_core::{
    DETAIL_TOKEN_BUDGET, Observation, ObservationKind, QueryFilter, Result, SEARCH_TOKEN_BUDGET,
    TIMELINE_MAX_PATHS, TIMELINE_MAX_RELATED, TIMELINE_TOKEN_BUDGET,
};
use chronicle_storage::Store;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use budget::{estimate_tokens, truncate_to_tokens};

/// Search view result: the cheapest read, summaries only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub context: String,
    pub summary: String,
}

/// Timeline view result: summary plus temporal context and relationships.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub context: String,
    pub kind: ObservationKind,
    pub summary: String,
    /// At most [`TIMELINE_MAX_PATHS`] of the observation's paths
    pub related_paths: Vec<String>,
    /// Ids of the nearest-in-time observations sharing a path or context,
    /// recomputed at read time
    pub related: Vec<i64>,
}

/// The tiered read interface over an observation store.
#[derive(Clone)]
pub struct DisclosureEngine {
    store: Store,
}

impl DisclosureEngine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Search observations: summaries only, most recent first.
    ///
    /// An empty query returns the most recent observations.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn search(&self, text: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let filter = text_filter(text);
        let observations = self.store.query(&filter, limit)?;
        Ok(observations.into_iter().map(search_hit).collect())
    }

    /// Timeline around a topic: summaries plus timestamps, kinds, paths and
    /// the ids of nearby related observations.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn timeline(&self, topic: &str, limit: usize) -> Result<Vec<TimelineEntry>> {
        let filter = text_filter(topic);
        let observations = self.store.query(&filter, limit)?;
        observations
            .into_iter()
            .map(|obs| {
                let related = self.store.nearest_related(&obs, TIMELINE_MAX_RELATED)?;
                Ok(timeline_entry(obs, related))
            })
            .collect()
    }

    /// Full record for one observation, detail payload truncated to the
    /// detail budget.
    ///
    /// # Errors
    /// `NotFound` for an unknown id, `Persistence` on storage failure.
    pub fn detail(&self, id: i64) -> Result<Observation> {
        let mut obs = self.store.get(id)?;
        if let Some(detail) = obs.detail.take() {
            let used = estimate_tokens(&obs.summary) + meta_overhead(&obs);
            let budget = DETAIL_TOKEN_BUDGET.saturating_sub(used).max(1);
            obs.detail = Some(truncate_to_tokens(&detail, budget));
        }
        Ok(obs)
    }
}

fn text_filter(text: &str) -> QueryFilter {
    let text = text.trim();
    QueryFilter {
        text: (!text.is_empty()).then(|| text.to_string()),
        ..QueryFilter::default()
    }
}

fn search_hit(obs: Observation) -> SearchHit {
    // id + context + structure eat into the per-result budget.
    let overhead = estimate_tokens(&obs.context) + 6;
    let summary_budget = SEARCH_TOKEN_BUDGET.saturating_sub(overhead).max(1);
    SearchHit {
        id: obs.id,
        context: obs.context,
        summary: truncate_to_tokens(&obs.summary, summary_budget),
    }
}

fn timeline_entry(obs: Observation, related: Vec<i64>) -> TimelineEntry {
    let mut related_paths = obs.related_paths;
    related_paths.truncate(TIMELINE_MAX_PATHS);

    let overhead = meta_overhead_parts(&obs.context, &related_paths) + 2 * related.len();
    let summary_budget = TIMELINE_TOKEN_BUDGET.saturating_sub(overhead).max(1);

    TimelineEntry {
        id: obs.id,
        timestamp: obs.timestamp,
        context: obs.context.clone(),
        kind: obs.kind,
        summary: truncate_to_tokens(&obs.summary, summary_budget),
        related_paths,
        related,
    }
}

/// Token cost of everything in a record that is not the summary or detail.
fn meta_overhead(obs: &Observation) -> usize {
    meta_overhead_parts(&obs.context, &obs.related_paths)
}

fn meta_overhead_parts(context: &str, paths: &[String]) -> usize {
    let paths_tokens: usize = paths.iter().map(|p| estimate_tokens(p)).sum();
    // timestamp, kind, numeric fields and JSON structure
    estimate_tokens(context) + paths_tokens + 20
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::{ChronicleError, ObservationDraft};
    use tempfile::TempDir;

    fn engine_with_store() -> (DisclosureEngine, Store, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::open(&temp_dir.path().join("test.db")).unwrap();
        (DisclosureEngine::new(store.clone()), store, temp_dir)
    }

    fn capture(
        store: &Store,
        context: &str,
        kind: ObservationKind,
        summary: &str,
        path: Option<&str>,
    ) -> i64 {
        let mut draft = ObservationDraft::new(context, kind, summary);
        if let Some(p) = path {
            draft = draft.path(p);
        }
        store.capture(&draft).unwrap()
    }

    #[test]
    fn search_returns_matching_summaries() {
        let (engine, store, _tmp) = engine_with_store();
        capture(&store, "backend", ObservationKind::FileChange, "Edited carousel widget", None);
        capture(&store, "backend", ObservationKind::ToolUsage, "Ran formatter", None);

        let hits = engine.search("carousel", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].summary, "Edited carousel widget");
        assert_eq!(hits[0].context, "backend");
    }

    #[test]
    fn search_never_includes_detail_payload() {
        let (engine, store, _tmp) = engine_with_store();
        let secret = "detail-payload-marker-that-must-not-leak";
        store
            .capture(
                &ObservationDraft::new("backend", ObservationKind::ToolUsage, "Ran deploy")
                    .detail(secret.repeat(50)),
            )
            .unwrap();

        let hits = engine.search("deploy", 10).unwrap();
        let serialized = serde_json::to_string(&hits).unwrap();
        assert!(!serialized.contains("marker-that-must-not-leak"));
    }

    #[test]
    fn search_results_stay_within_token_budget() {
        let (engine, store, _tmp) = engine_with_store();
        let huge_summary = "deploy pipeline step ".repeat(100);
        capture(&store, "backend", ObservationKind::ToolUsage, &huge_summary, None);

        let hits = engine.search("deploy", 10).unwrap();
        for hit in &hits {
            let serialized = serde_json::to_string(hit).unwrap();
            assert!(
                estimate_tokens(&serialized) <= SEARCH_TOKEN_BUDGET + 5,
                "hit exceeds budget: {} tokens",
                estimate_tokens(&serialized)
            );
        }
    }

    #[test]
    fn timeline_carries_relationships_and_capped_paths() {
        let (engine, store, _tmp) = engine_with_store();
        let a = capture(
            &store,
            "backend",
            ObservationKind::FileChange,
            "Edited api handler",
            Some("app/api.py"),
        );
        let b = capture(
            &store,
            "backend",
            ObservationKind::FileChange,
            "Edited api handler again",
            Some("app/api.py"),
        );
        // Five paths on one observation; the view must cap at three.
        let mut draft =
            ObservationDraft::new("backend", ObservationKind::FileChange, "Edited api surface");
        for i in 0..5 {
            draft = draft.path(format!("app/module_{i}.py"));
        }
        store.capture(&draft).unwrap();

        let entries = engine.timeline("api", 10).unwrap();
        assert_eq!(entries.len(), 3);

        let many_paths = entries.iter().find(|e| e.summary == "Edited api surface").unwrap();
        assert_eq!(many_paths.related_paths.len(), TIMELINE_MAX_PATHS);

        let first = entries.iter().find(|e| e.id == a).unwrap();
        assert!(first.related.contains(&b));
        assert!(first.related.len() <= TIMELINE_MAX_RELATED);
    }

    #[test]
    fn timeline_results_stay_within_token_budget() {
        let (engine, store, _tmp) = engine_with_store();
        let huge_summary = "investigated failing integration test in service layer ".repeat(40);
        store
            .capture(
                &ObservationDraft::new("backend", ObservationKind::Error, huge_summary)
                    .detail("very long stack trace ".repeat(200))
                    .path("src/service/worker.rs")
                    .path("src/service/queue.rs"),
            )
            .unwrap();

        let entries = engine.timeline("integration", 10).unwrap();
        assert_eq!(entries.len(), 1);
        let serialized = serde_json::to_string(&entries[0]).unwrap();
        assert!(
            estimate_tokens(&serialized) <= TIMELINE_TOKEN_BUDGET + 10,
            "entry exceeds budget: {} tokens",
            estimate_tokens(&serialized)
        );
        assert!(!serialized.contains("stack trace"));
    }

    #[test]
    fn detail_returns_full_record_with_truncated_payload() {
        let (engine, store, _tmp) = engine_with_store();
        let id = store
            .capture(
                &ObservationDraft::new("backend", ObservationKind::Decision, "Adopt adapter pattern")
                    .detail("rationale line ".repeat(500)),
            )
            .unwrap();

        let obs = engine.detail(id).unwrap();
        assert_eq!(obs.summary, "Adopt adapter pattern");
        let detail = obs.detail.unwrap();
        assert!(detail.ends_with("..."));
        assert!(estimate_tokens(&detail) <= DETAIL_TOKEN_BUDGET);
    }

    #[test]
    fn detail_unknown_id_is_not_found() {
        let (engine, _store, _tmp) = engine_with_store();
        assert!(matches!(engine.detail(777), Err(ChronicleError::NotFound(_))));
    }
}
