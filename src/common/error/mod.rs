//! Unified error types for liturgy-deck.
//!
//! Lower layers (package, presentation, automation) carry their own error
//! enums; this module folds them into one type for the public API.

pub mod types;

pub use types::{Error, Result};
