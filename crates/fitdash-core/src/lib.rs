//! Shared types for fitdash.
//!
//! Holds the error taxonomy, the canonical data model, the column-mapping
//! configuration and the single timestamp convention used by every source.

pub mod error;
pub mod formatting;
pub mod models;
pub mod schema;
pub mod settings;
pub mod time_utils;

pub use error::{FitdashError, Result};
