//! Safety gate between mined patterns and document edits.
//!
//! A pattern never touches a document directly. The gate renders it into a
//! markdown fragment, validates the fragment against the target document,
//! and then decides: high confidence and valid means the fragment is
//! appended, invalid means rejected with a reason, anything else is queued
//! for human review. Every decision is recorded back into the observation
//! store so the whole loop stays auditable.

mod conflict;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chronicle_core::{
    ChronicleError, GateConfig, ObservationDraft, ObservationKind, Pattern, PatternKind,
    QueuedUpdate, Result, Update, UpdateStatus,
};
use chronicle_miner::{PatternMiner, Window};
use chronicle_storage::Store;

pub use conflict::{ConflictCheck, FROZEN_MARKER, MANUAL_END, MANUAL_START, MarkerConflictCheck};

/// Applies, queues or rejects document updates proposed by the miner.
pub struct UpdateGate {
    store: Store,
    docs_dir: PathBuf,
    config: GateConfig,
    conflict: Box<dyn ConflictCheck>,
}

impl fmt::Debug for UpdateGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateGate")
            .field("docs_dir", &self.docs_dir)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl UpdateGate {
    /// Gate with the default marker-based conflict check.
    pub fn new(store: Store, docs_dir: impl Into<PathBuf>, config: GateConfig) -> Self {
        Self::with_conflict_check(store, docs_dir, config, Box::new(MarkerConflictCheck))
    }

    pub fn with_conflict_check(
        store: Store,
        docs_dir: impl Into<PathBuf>,
        config: GateConfig,
        conflict: Box<dyn ConflictCheck>,
    ) -> Self {
        Self { store, docs_dir: docs_dir.into(), config, conflict }
    }

    /// Render, validate and decide on one pattern.
    ///
    /// Every path through here is terminal: the returned update is
    /// `Applied` (fragment written, fingerprint recorded), `Rejected`
    /// (validation failed, reason set) or `Queued` (valid but below the
    /// auto-apply threshold, persisted for review). The outcome is also
    /// captured as a `SessionEvent` observation.
    ///
    /// # Errors
    /// `Persistence` on storage failure, `Io` when the target document
    /// cannot be read or written.
    pub fn propose(&self, pattern: &Pattern) -> Result<Update> {
        let fragment = render_fragment(&pattern.proposed_text);
        let mut update = Update {
            pattern_kind: pattern.kind,
            target_document: pattern.target_document.clone(),
            fragment,
            confidence: pattern.confidence,
            evidence: pattern.evidence.clone(),
            status: UpdateStatus::Rejected,
            reason: None,
        };

        if let Some(reason) = self.validate(&update)? {
            update.reason = Some(reason);
            self.record_outcome(&update)?;
            return Ok(update);
        }

        if pattern.confidence >= self.config.auto_apply_threshold {
            self.apply(&update)?;
            update.status = UpdateStatus::Applied;
        } else {
            update.status = UpdateStatus::Queued;
            update.reason = Some(format!(
                "confidence {:.2} below auto-apply threshold {:.2}",
                pattern.confidence, self.config.auto_apply_threshold
            ));
            self.store.enqueue_update(&update)?;
        }

        self.record_outcome(&update)?;
        Ok(update)
    }

    /// Updates waiting for review, oldest first.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn queued_updates(&self) -> Result<Vec<QueuedUpdate>> {
        self.store.queued_updates()
    }

    /// Resolve one queued update.
    ///
    /// Approval re-validates against the current document state before
    /// applying; the document may have changed since the update was queued.
    /// Either way the queue row is resolved and resolution is terminal.
    ///
    /// # Errors
    /// `NotFound` if the queue id does not exist or was already resolved,
    /// `Persistence` / `Io` on storage or filesystem failure.
    pub fn review(&self, queue_id: i64, approve: bool) -> Result<Update> {
        let queued = self.store.get_queued(queue_id)?;
        let mut update = Update {
            pattern_kind: queued.pattern_kind,
            target_document: queued.target_document,
            fragment: queued.fragment,
            confidence: queued.confidence,
            evidence: queued.evidence,
            status: UpdateStatus::Rejected,
            reason: None,
        };

        if !approve {
            update.reason = Some("rejected by reviewer".to_string());
        } else if let Some(reason) = self.validate(&update)? {
            update.reason = Some(reason);
        } else {
            self.apply(&update)?;
            update.status = UpdateStatus::Applied;
        }

        self.store.resolve_queued(queue_id, update.status, update.reason.as_deref())?;
        self.record_outcome(&update)?;
        Ok(update)
    }

    /// Mine a window and feed every detected pattern through the gate.
    ///
    /// One failing proposal is logged and skipped so the rest of the pass
    /// still runs.
    ///
    /// # Errors
    /// `Persistence` when the mining query itself fails.
    pub fn run_mining_pass(&self, miner: &PatternMiner, window: &Window) -> Result<Vec<Update>> {
        let patterns = miner.detect_patterns(&self.store, window)?;
        let mut updates = Vec::with_capacity(patterns.len());
        for pattern in &patterns {
            match self.propose(pattern) {
                Ok(update) => updates.push(update),
                Err(error) => {
                    tracing::warn!(
                        kind = %pattern.kind,
                        target = %pattern.target_document,
                        %error,
                        "skipping pattern, proposal failed"
                    );
                },
            }
        }
        tracing::info!(
            patterns = patterns.len(),
            applied = updates.iter().filter(|u| u.status == UpdateStatus::Applied).count(),
            queued = updates.iter().filter(|u| u.status == UpdateStatus::Queued).count(),
            rejected = updates.iter().filter(|u| u.status == UpdateStatus::Rejected).count(),
            "mining pass gated"
        );
        Ok(updates)
    }

    /// Validation failure reason, or `None` when the update may proceed.
    fn validate(&self, update: &Update) -> Result<Option<String>> {
        if update.fragment.is_empty() {
            return Ok(Some("fragment is empty after rendering".to_string()));
        }

        let budget = self.config.line_budget_for(&update.target_document);
        let lines = update.fragment.lines().count();
        if lines > budget {
            return Ok(Some(format!(
                "fragment is {lines} lines, budget for this document is {budget}"
            )));
        }

        let fingerprint = fingerprint(update.pattern_kind, &update.evidence);
        if self.store.is_applied(&fingerprint)? {
            return Ok(Some("an update for this evidence was already applied".to_string()));
        }

        let path = match self.document_path(&update.target_document) {
            Some(path) => path,
            None => {
                return Ok(Some(format!(
                    "invalid document name: {}",
                    update.target_document
                )));
            },
        };
        if !path.is_file() {
            return Ok(Some(format!("target document does not exist: {}", path.display())));
        }

        let document = fs::read_to_string(&path)?;
        if document.contains(&update.fragment) {
            return Ok(Some("fragment already present in document".to_string()));
        }
        if let Some(reason) = self.conflict.check(&document) {
            return Ok(Some(reason));
        }

        Ok(None)
    }

    /// Append the fragment and record its fingerprint. Call only after
    /// `validate` returned `None`.
    fn apply(&self, update: &Update) -> Result<()> {
        let path = self.document_path(&update.target_document).ok_or_else(|| {
            ChronicleError::validation(format!(
                "invalid document name: {}",
                update.target_document
            ))
        })?;
        let mut document = fs::read_to_string(&path)?;
        if !document.is_empty() && !document.ends_with('\n') {
            document.push('\n');
        }
        document.push_str(&update.fragment);
        document.push('\n');
        fs::write(&path, document)?;

        self.store
            .record_applied(&fingerprint(update.pattern_kind, &update.evidence), &update.target_document)?;
        tracing::info!(
            target = %update.target_document,
            kind = %update.pattern_kind,
            confidence = update.confidence,
            "applied update"
        );
        Ok(())
    }

    /// Capture the decision as a `SessionEvent` so the audit trail lives in
    /// the store itself. `SessionEvent` rather than `Decision` keeps gate
    /// bookkeeping out of the decision-point detector.
    fn record_outcome(&self, update: &Update) -> Result<()> {
        let summary = format!(
            "Update {} for document {} ({})",
            update.status.as_str(),
            update.target_document,
            update.pattern_kind
        );
        let mut draft =
            ObservationDraft::new(&update.target_document, ObservationKind::SessionEvent, summary);
        if let Some(reason) = &update.reason {
            draft = draft.detail(reason.clone());
        }
        self.store.capture(&draft)?;
        Ok(())
    }

    /// `<docs_dir>/<name>.md`, or `None` when the logical name would escape
    /// the docs directory.
    fn document_path(&self, target_document: &str) -> Option<PathBuf> {
        let valid = !target_document.is_empty()
            && !target_document.contains(['/', '\\'])
            && !Path::new(target_document)
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)));
        valid.then(|| self.docs_dir.join(format!("{target_document}.md")))
    }
}

/// Idempotence key for an update: pattern kind plus its sorted evidence ids.
fn fingerprint(kind: PatternKind, evidence: &[i64]) -> String {
    let mut ids: Vec<i64> = evidence.to_vec();
    ids.sort_unstable();
    let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
    format!("{}:{}", kind.as_str(), ids.join(","))
}

/// Document-ready form of a pattern's proposed text: heading lines are
/// dropped (the target document owns its structure) and trailing blank
/// lines are trimmed.
fn render_fragment(proposed_text: &str) -> String {
    let kept: Vec<&str> = proposed_text
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect();
    kept.join("\n").trim_end().to_string()
}
