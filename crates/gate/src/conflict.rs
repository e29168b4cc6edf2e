//! Pluggable conflict detection against manually-edited document regions.
//!
//! What counts as a manual region is owned by whoever maintains the target
//! documents, so the gate takes the check as a trait object. The default
//! implementation understands two marker conventions:
//!
//! - `<!-- chronicle:frozen -->` anywhere makes the whole document
//!   hands-off.
//! - A `<!-- chronicle:manual -->` block left open (no matching
//!   `<!-- chronicle:end-manual -->` after it) means the append point sits
//!   inside a manual region.

pub const FROZEN_MARKER: &str = "<!-- chronicle:frozen -->";
pub const MANUAL_START: &str = "<!-- chronicle:manual -->";
pub const MANUAL_END: &str = "<!-- chronicle:end-manual -->";

/// Decides whether appending to a document would clobber manual edits.
///
/// Returns `Some(reason)` on conflict, `None` when appending is safe.
pub trait ConflictCheck: Send + Sync {
    fn check(&self, document: &str) -> Option<String>;
}

/// The default marker-based check.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkerConflictCheck;

impl ConflictCheck for MarkerConflictCheck {
    fn check(&self, document: &str) -> Option<String> {
        if document.contains(FROZEN_MARKER) {
            return Some("document is marked frozen".to_string());
        }
        if let Some(start) = document.rfind(MANUAL_START) {
            let closed = document[start..].contains(MANUAL_END);
            if !closed {
                return Some("append point is inside an open manual region".to_string());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_document_has_no_conflict() {
        assert!(MarkerConflictCheck.check("# Notes\n\n- a bullet\n").is_none());
    }

    #[test]
    fn frozen_marker_conflicts() {
        let doc = format!("# Notes\n{FROZEN_MARKER}\n- a bullet\n");
        assert!(MarkerConflictCheck.check(&doc).is_some());
    }

    #[test]
    fn open_manual_block_conflicts() {
        let doc = format!("# Notes\n{MANUAL_START}\nhand-written text\n");
        assert!(MarkerConflictCheck.check(&doc).is_some());
    }

    #[test]
    fn closed_manual_block_does_not_conflict() {
        let doc = format!("# Notes\n{MANUAL_START}\nhand-written\n{MANUAL_END}\n");
        assert!(MarkerConflictCheck.check(&doc).is_none());
    }

    #[test]
    fn reopened_manual_block_after_closed_one_conflicts() {
        let doc =
            format!("{MANUAL_START}\nfirst\n{MANUAL_END}\nmiddle\n{MANUAL_START}\nsecond\n");
        assert!(MarkerConflictCheck.check(&doc).is_some());
    }
}
