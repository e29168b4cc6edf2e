//! Storage layer for chronicle
//!
//! SQLite-backed, append-only observation log with the session, queued-update
//! and applied-fragment tables the other crates build on. Writes are
//! serialized by SQLite itself (WAL + busy timeout), so short-lived
//! collaborator processes can capture concurrently.

mod migrations;
mod store;
#[cfg(test)]
mod tests;

pub use store::Store;
