use clap::Parser;
use std::path::PathBuf;

use crate::error::{FitdashError, Result};
use crate::models::{FilterSpec, Resolution, UserId};
use crate::schema::SchemaMap;
use crate::time_utils::TimestampParser;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Unify per-metric fitness exports and query them by user and time range
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fitdash",
    about = "Unify per-metric fitness exports and query them by user and time range",
    version
)]
pub struct Settings {
    /// Export folder to load; repeat to merge several (later folders win collisions)
    #[arg(long = "data", default_values = ["data/Folder_1", "data/Folder_2"])]
    pub data: Vec<PathBuf>,

    /// Column-mapping file (defaults to ~/.fitdash/schema.json, then the built-in layout)
    #[arg(long, env = "FITDASH_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Table to query
    #[arg(long, default_value = "day", value_parser = ["minute", "hour", "day"])]
    pub resolution: String,

    /// Restrict to one user id
    #[arg(long)]
    pub user: Option<i64>,

    /// Inclusive start of the time range
    #[arg(long)]
    pub start: Option<String>,

    /// Inclusive end of the time range
    #[arg(long)]
    pub end: Option<String>,

    /// Number of rows to preview
    #[arg(long, default_value = "20")]
    pub limit: usize,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments and apply `--debug`.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] for an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::resolve(Settings::parse_from(args))
    }

    fn resolve(mut settings: Settings) -> Self {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    pub fn resolution(&self) -> Result<Resolution> {
        self.resolution.parse()
    }

    /// Mapping file to use: `--schema` when given, otherwise the default path.
    pub fn schema_path(&self) -> PathBuf {
        self.schema.clone().unwrap_or_else(SchemaMap::default_path)
    }

    /// Build the query described by the flags.
    ///
    /// Bounds are read with `parser`, so they use the same timezone as the
    /// sources. A range whose start is after its end is rejected here.
    pub fn filter_spec(&self, parser: &TimestampParser) -> Result<FilterSpec> {
        let mut spec = FilterSpec::new(self.resolution()?);
        if let Some(id) = self.user {
            spec = spec.user(UserId(id));
        }
        if let Some(start) = &self.start {
            spec = spec.start(parse_bound(parser, "--start", start)?);
        }
        if let Some(end) = &self.end {
            spec = spec.end(parse_bound(parser, "--end", end)?);
        }
        spec.validate()?;
        Ok(spec)
    }
}

fn parse_bound(
    parser: &TimestampParser,
    flag: &str,
    value: &str,
) -> Result<chrono::DateTime<chrono::Utc>> {
    parser
        .parse_instant(value)
        .ok_or_else(|| FitdashError::Config(format!("invalid {flag} timestamp: {value}")))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
