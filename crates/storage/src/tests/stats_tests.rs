use chronicle_core::ObservationKind;

use super::{draft, test_store};

#[test]
fn stats_on_empty_store() {
    let (store, _temp_dir) = test_store();

    let stats = store.stats().unwrap();
    assert_eq!(stats.total, 0);
    assert!(stats.by_context.is_empty());
    assert!(stats.by_kind.is_empty());
    assert!(stats.date_range.is_none());
    assert!(stats.size_on_disk_bytes > 0); // schema pages exist
}

#[test]
fn stats_breakdowns() {
    let (store, _temp_dir) = test_store();

    store.capture(&draft("backend", ObservationKind::FileChange, "Edited a")).unwrap();
    store.capture(&draft("backend", ObservationKind::ToolUsage, "Ran b")).unwrap();
    store.capture(&draft("frontend", ObservationKind::FileChange, "Edited c")).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_context, vec![
        ("backend".to_string(), 2),
        ("frontend".to_string(), 1)
    ]);
    assert_eq!(stats.by_kind, vec![
        ("file_change".to_string(), 2),
        ("tool_usage".to_string(), 1)
    ]);

    let (oldest, newest) = stats.date_range.unwrap();
    assert!(oldest <= newest);
}
