mod queue_tests;
mod session_tests;
mod stats_tests;

use chronicle_core::{ObservationDraft, ObservationKind};
use tempfile::TempDir;

use crate::Store;

pub(crate) fn test_store() -> (Store, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let store = Store::open(&db_path).unwrap();
    (store, temp_dir)
}

pub(crate) fn draft(
    context: &str,
    kind: ObservationKind,
    summary: impl Into<String>,
) -> ObservationDraft {
    ObservationDraft::new(context, kind, summary)
}
