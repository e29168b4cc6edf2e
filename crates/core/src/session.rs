use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bounded unit of work within one context.
///
/// A session ends explicitly (`end_session`) or implicitly when a new
/// session starts in the same context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub context: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}
