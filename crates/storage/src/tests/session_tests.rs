use chronicle_core::{ChronicleError, ObservationKind};

use super::{draft, test_store};

#[test]
fn begin_and_get_session() {
    let (store, _temp_dir) = test_store();

    let id = store.begin_session("backend").unwrap();
    let session = store.get_session(id).unwrap();

    assert_eq!(session.context, "backend");
    assert!(session.is_active());
}

#[test]
fn new_session_implicitly_ends_previous_in_same_context() {
    let (store, _temp_dir) = test_store();

    let first = store.begin_session("backend").unwrap();
    let second = store.begin_session("backend").unwrap();

    assert!(!store.get_session(first).unwrap().is_active());
    assert!(store.get_session(second).unwrap().is_active());
}

#[test]
fn sessions_in_other_contexts_stay_active() {
    let (store, _temp_dir) = test_store();

    let backend = store.begin_session("backend").unwrap();
    store.begin_session("frontend").unwrap();

    assert!(store.get_session(backend).unwrap().is_active());
}

#[test]
fn end_session_is_idempotent() {
    let (store, _temp_dir) = test_store();

    let id = store.begin_session("backend").unwrap();
    store.end_session(id).unwrap();
    store.end_session(id).unwrap();

    assert!(!store.get_session(id).unwrap().is_active());
}

#[test]
fn end_unknown_session_is_not_found() {
    let (store, _temp_dir) = test_store();

    let result = store.end_session(424_242);
    assert!(matches!(result, Err(ChronicleError::NotFound(_))));
}

#[test]
fn active_session_lookup() {
    let (store, _temp_dir) = test_store();

    assert!(store.active_session("backend").unwrap().is_none());

    let id = store.begin_session("backend").unwrap();
    let active = store.active_session("backend").unwrap().unwrap();
    assert_eq!(active.id, id);

    store.end_session(id).unwrap();
    assert!(store.active_session("backend").unwrap().is_none());
}

#[test]
fn observation_may_reference_session() {
    let (store, _temp_dir) = test_store();

    let session_id = store.begin_session("backend").unwrap();
    let obs_id = store
        .capture(
            &draft("backend", ObservationKind::SessionEvent, "Session checkpoint")
                .session(session_id),
        )
        .unwrap();

    assert_eq!(store.get(obs_id).unwrap().session_id, Some(session_id));
}
