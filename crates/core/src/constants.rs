//! Shared constants for chronicle.
//!
//! Centralizes limits and budgets used by more than one crate.

/// Maximum number of results for any query (DoS protection).
pub const MAX_QUERY_LIMIT: usize = 1000;

/// Default number of results when limit is not specified by the caller.
pub const DEFAULT_QUERY_LIMIT: usize = 20;

/// Per-result token budget for the search view (summaries only).
pub const SEARCH_TOKEN_BUDGET: usize = 50;

/// Per-result token budget for the timeline view (summary + relationships).
pub const TIMELINE_TOKEN_BUDGET: usize = 200;

/// Token budget for a single detail read (full record).
pub const DETAIL_TOKEN_BUDGET: usize = 500;

/// How many related-path entries a timeline entry carries at most.
pub const TIMELINE_MAX_PATHS: usize = 3;

/// How many nearest-in-time relationship ids a timeline entry carries.
pub const TIMELINE_MAX_RELATED: usize = 2;
