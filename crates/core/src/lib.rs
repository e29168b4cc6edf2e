//! Core types and configuration for chronicle
//!
//! This crate contains domain types shared across all other crates.

mod config;
mod constants;
mod error;
mod observation;
mod pattern;
mod session;
mod update;

pub use config::*;
pub use constants::*;
pub use error::*;
pub use observation::*;
pub use pattern::*;
pub use session::*;
pub use update::*;
