//! Data layer for fitdash.
//!
//! Turns raw per-file records into three resolution-aligned canonical
//! tables and answers filter and summary queries over them. The CSV loader
//! is the only module that reads from disk.

pub mod dataset;
pub mod filter;
pub mod loader;
pub mod normalizer;
pub mod summary;
pub mod unifier;

pub use dataset::Dataset;
pub use fitdash_core as core;
