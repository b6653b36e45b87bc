use std::path::Path;

use fitdash_core::schema::SchemaMap;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` value onto an `EnvFilter` directive.
///
/// Unknown values are passed through so `RUST_LOG`-style directives such as
/// `fitdash_data=debug` also work.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber, writing to stderr so that
/// stdout carries only query output.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry().with(filter).with(layer).try_init()?;
    Ok(())
}

// ── Schema bootstrap ───────────────────────────────────────────────────────────

/// Resolve the column mapping.
///
/// An explicitly requested file must exist; the default location falls back
/// to the built-in Fitbit layout when absent.
pub fn load_schema(path: &Path, explicit: bool) -> anyhow::Result<SchemaMap> {
    if explicit {
        return SchemaMap::load_from(path).map_err(Into::into);
    }
    Ok(SchemaMap::load_or_default(path)?)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
