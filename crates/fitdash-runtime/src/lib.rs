//! Runtime layer for fitdash.
//!
//! Owns the current [`Dataset`](fitdash_data::Dataset) and replaces it
//! atomically when the export folders are reloaded.

pub mod manager;

pub use fitdash_core as core;
pub use fitdash_data as data;
