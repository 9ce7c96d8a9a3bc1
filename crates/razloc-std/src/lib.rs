//! Shared utilities for the razloc crates: located errors, content hashing
//! and path normalization.

pub mod error;
pub mod hash;
pub mod path;

pub use error::{ErrKind, Error, Result};
