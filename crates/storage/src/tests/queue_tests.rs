use chronicle_core::{ChronicleError, PatternKind, Update, UpdateStatus};

use super::test_store;

fn queued_update(target: &str) -> Update {
    Update {
        pattern_kind: PatternKind::RepeatedFile,
        target_document: target.to_string(),
        fragment: "- **Active development: app/api.py** (3 touches)".to_string(),
        confidence: 0.5,
        evidence: vec![1, 2, 3],
        status: UpdateStatus::Queued,
        reason: Some("confidence 0.50 below threshold 0.80".to_string()),
    }
}

#[test]
fn fingerprint_ledger_roundtrip() {
    let (store, _temp_dir) = test_store();

    assert!(!store.is_applied("repeated_file:1,2,3").unwrap());
    store.record_applied("repeated_file:1,2,3", "backend").unwrap();
    assert!(store.is_applied("repeated_file:1,2,3").unwrap());

    // Re-recording is harmless.
    store.record_applied("repeated_file:1,2,3", "backend").unwrap();
    assert!(store.is_applied("repeated_file:1,2,3").unwrap());
}

#[test]
fn enqueue_and_list() {
    let (store, _temp_dir) = test_store();

    let first = store.enqueue_update(&queued_update("backend")).unwrap();
    let second = store.enqueue_update(&queued_update("frontend")).unwrap();

    let queued = store.queued_updates().unwrap();
    assert_eq!(queued.len(), 2);
    assert_eq!(queued[0].id, first);
    assert_eq!(queued[1].id, second);
    assert_eq!(queued[0].pattern_kind, PatternKind::RepeatedFile);
    assert_eq!(queued[0].evidence, vec![1, 2, 3]);
}

#[test]
fn resolve_removes_from_queue() {
    let (store, _temp_dir) = test_store();

    let id = store.enqueue_update(&queued_update("backend")).unwrap();
    store.resolve_queued(id, UpdateStatus::Applied, None).unwrap();

    assert!(store.queued_updates().unwrap().is_empty());
    assert!(matches!(store.get_queued(id), Err(ChronicleError::NotFound(_))));
}

#[test]
fn resolve_is_terminal() {
    let (store, _temp_dir) = test_store();

    let id = store.enqueue_update(&queued_update("backend")).unwrap();
    store
        .resolve_queued(id, UpdateStatus::Rejected, Some("reviewer declined"))
        .unwrap();

    let again = store.resolve_queued(id, UpdateStatus::Applied, None);
    assert!(matches!(again, Err(ChronicleError::NotFound(_))));
}

#[test]
fn resolve_rejects_non_terminal_status() {
    let (store, _temp_dir) = test_store();

    let id = store.enqueue_update(&queued_update("backend")).unwrap();
    let result = store.resolve_queued(id, UpdateStatus::Queued, None);
    assert!(matches!(result, Err(ChronicleError::Validation(_))));
}
