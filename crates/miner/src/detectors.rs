//! The four pattern detectors.
//!
//! Each detector is a pure function over the fetched window, so detection is
//! reproducible and testable without a store. Malformed observations are
//! skipped, never fatal: one bad record must not block detection over the
//! rest of the window.

use std::collections::BTreeMap;

use chronicle_core::{MinerConfig, Observation, ObservationKind, Pattern, PatternKind};

/// Group `FileChange` observations per touched path; enough touches inside
/// the window mean active churn worth surfacing.
pub(crate) fn repeated_files(config: &MinerConfig, observations: &[Observation]) -> Vec<Pattern> {
    let mut by_path: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        if obs.kind != ObservationKind::FileChange {
            continue;
        }
        for path in &obs.related_paths {
            by_path.entry(path.as_str()).or_default().push(obs);
        }
    }

    by_path
        .into_iter()
        .filter(|(_, touches)| touches.len() >= config.min_touches)
        .map(|(path, touches)| {
            let confidence =
                (touches.len() as f64 / config.repeated_file_saturation).min(config.repeated_file_max);
            let summaries: Vec<&str> =
                touches.iter().take(3).map(|o| o.summary.as_str()).collect();
            let proposed_text = format!(
                "- **Active development: {path}** (touched {} times in this window)\n  - {}",
                touches.len(),
                summaries.join("; "),
            );
            Pattern {
                kind: PatternKind::RepeatedFile,
                confidence,
                evidence: evidence_ids(&touches),
                proposed_text,
                target_document: dominant_context(&touches),
            }
        })
        .collect()
}

/// One pattern per context whose observations mention a feature keyword.
pub(crate) fn new_features(config: &MinerConfig, observations: &[Observation]) -> Vec<Pattern> {
    let mut by_context: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        if mentions_feature(config, obs) {
            by_context.entry(obs.context.as_str()).or_default().push(obs);
        }
    }

    by_context
        .into_iter()
        .map(|(context, hits)| {
            let bullets: Vec<String> =
                hits.iter().take(3).map(|o| format!("  - {}", o.summary)).collect();
            let proposed_text = format!(
                "- **Feature work in {context}** ({} observations)\n{}",
                hits.len(),
                bullets.join("\n"),
            );
            Pattern {
                kind: PatternKind::NewFeature,
                confidence: config.feature_confidence,
                evidence: evidence_ids(&hits),
                proposed_text,
                target_document: context.to_string(),
            }
        })
        .collect()
}

/// Every explicit decision is its own pattern. These are author-asserted,
/// not inferred, so confidence is fixed and high.
pub(crate) fn decision_points(config: &MinerConfig, observations: &[Observation]) -> Vec<Pattern> {
    observations
        .iter()
        .filter(|obs| obs.kind == ObservationKind::Decision)
        .map(|obs| {
            let mut proposed_text = format!("- **Decision:** {}", obs.summary);
            if let Some(first_line) = obs.detail.as_deref().and_then(|d| d.lines().next()) {
                if !first_line.trim().is_empty() {
                    proposed_text.push_str(&format!("\n  - {}", first_line.trim()));
                }
            }
            Pattern {
                kind: PatternKind::DecisionPoint,
                confidence: config.decision_confidence,
                evidence: vec![obs.id],
                proposed_text,
                target_document: obs.context.clone(),
            }
        })
        .collect()
}

/// Group `Error` observations by normalized signature; recurring signatures
/// become patterns whose confidence grows with the recurrence count.
pub(crate) fn error_patterns(config: &MinerConfig, observations: &[Observation]) -> Vec<Pattern> {
    let mut by_signature: BTreeMap<String, Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        if obs.kind != ObservationKind::Error {
            continue;
        }
        let signature = normalize_error_signature(&obs.summary);
        if signature.is_empty() {
            continue;
        }
        by_signature.entry(signature).or_default().push(obs);
    }

    by_signature
        .into_iter()
        .filter(|(_, hits)| hits.len() >= config.min_error_recurrence)
        .map(|(signature, hits)| {
            let confidence = (hits.len() as f64 / config.error_saturation).min(config.error_max);
            let latest = hits.last().map_or("", |o| o.summary.as_str());
            let proposed_text = format!(
                "- **Recurring error ({}x):** {signature}\n  - Latest: {latest}",
                hits.len(),
            );
            Pattern {
                kind: PatternKind::ErrorPattern,
                confidence,
                evidence: evidence_ids(&hits),
                proposed_text,
                target_document: hits[0].context.clone(),
            }
        })
        .collect()
}

/// Canonical form of an error summary: first line, lower-cased, punctuation
/// stripped, whitespace collapsed. "Connection timeout to db" and
/// "connection TIMEOUT, to DB!" share one signature.
pub fn normalize_error_signature(summary: &str) -> String {
    let first_line = summary.lines().next().unwrap_or("");
    let lowered = first_line.to_lowercase();
    let cleaned: String =
        lowered.chars().map(|c| if c.is_alphanumeric() { c } else { ' ' }).collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn mentions_feature(config: &MinerConfig, obs: &Observation) -> bool {
    let summary = obs.summary.to_lowercase();
    let detail = obs.detail.as_deref().map(str::to_lowercase);
    config.feature_keywords.iter().any(|kw| {
        summary.contains(kw.as_str())
            || detail.as_deref().is_some_and(|d| d.contains(kw.as_str()))
    })
}

/// The context most of the touches came from. A path touched from several
/// contexts lands in the majority context, not whichever appeared first;
/// ties break to the lexicographically smallest context.
fn dominant_context(touches: &[&Observation]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for obs in touches {
        *counts.entry(obs.context.as_str()).or_default() += 1;
    }
    let mut best: (&str, usize) = ("", 0);
    for (context, count) in counts {
        if count > best.1 {
            best = (context, count);
        }
    }
    best.0.to_string()
}

fn evidence_ids(hits: &[&Observation]) -> Vec<i64> {
    let mut ids: Vec<i64> = hits.iter().map(|o| o.id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_normalization_strips_case_and_punctuation() {
        assert_eq!(
            normalize_error_signature("Connection timeout to db"),
            normalize_error_signature("connection TIMEOUT, to DB!")
        );
        assert_eq!(normalize_error_signature("Panic: index 3 out of bounds\nbacktrace..."),
            "panic index 3 out of bounds");
    }

    #[test]
    fn signature_of_punctuation_only_summary_is_empty() {
        assert_eq!(normalize_error_signature("!!! ???"), "");
    }
}
