//! Common types and utilities shared by the presentation layer and the merge engine.

pub mod error;
pub mod fs;
pub mod unit;
pub mod xml;

pub use error::{Error, Result};
