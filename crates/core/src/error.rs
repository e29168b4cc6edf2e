use std::io;
use std::result::Result as StdResult;

use thiserror::Error;

/// Errors that can occur in chronicle
#[derive(Error, Debug)]
pub enum ChronicleError {
    /// Caller error: bad input to `capture`/`propose`. Never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown id passed to `get`/`detail`. Surfaced to the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying storage unavailable or corrupt. Fatal for the current
    /// operation; the caller decides whether to retry or abort.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ChronicleError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

pub type Result<T> = StdResult<T, ChronicleError>;
