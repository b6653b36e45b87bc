use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by fitdash.
#[derive(Error, Debug)]
pub enum FitdashError {
    /// A source lacks a column its (resolution, family) mapping expects.
    ///
    /// Fatal for that source's contribution only.
    #[error("Schema mismatch in {source_name}: missing column {column}")]
    SchemaMismatch { source_name: String, column: String },

    /// A user identifier could not be parsed to an integer.
    #[error("Invalid identifier \"{value}\" in {source_name} (row {row})")]
    InvalidIdentifier {
        value: String,
        source_name: String,
        row: usize,
    },

    /// A timestamp did not parse or fell outside the accepted calendar range.
    #[error("Invalid timestamp \"{value}\" in {source_name} (row {row})")]
    InvalidTimestamp {
        value: String,
        source_name: String,
        row: usize,
    },

    /// A metric cell held something that is not a number of the metric's kind.
    #[error("Invalid value \"{value}\" for column {column} in {source_name} (row {row})")]
    InvalidValue {
        value: String,
        column: String,
        source_name: String,
        row: usize,
    },

    /// A filter's start bound is after its end bound.
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be parsed.
    #[error("Failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A configured data folder does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FitdashError {
    /// `true` for the per-record parsing failures that are collected into an
    /// ingest report rather than aborting a source.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            FitdashError::InvalidIdentifier { .. }
                | FitdashError::InvalidTimestamp { .. }
                | FitdashError::InvalidValue { .. }
        )
    }
}

/// Convenience alias used throughout the fitdash crates.
pub type Result<T> = std::result::Result<T, FitdashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_schema_mismatch() {
        let err = FitdashError::SchemaMismatch {
            source_name: "hourlySteps_merged.csv".to_string(),
            column: "StepTotal".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Schema mismatch in hourlySteps_merged.csv: missing column StepTotal"
        );
    }

    #[test]
    fn test_error_display_invalid_identifier() {
        let err = FitdashError::InvalidIdentifier {
            value: "abc".to_string(),
            source_name: "dailyActivity_merged.csv".to_string(),
            row: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("\"abc\""));
        assert!(msg.contains("dailyActivity_merged.csv"));
        assert!(msg.contains("row 3"));
    }

    #[test]
    fn test_error_display_invalid_timestamp() {
        let err = FitdashError::InvalidTimestamp {
            value: "13/45/2016".to_string(),
            source_name: "sleepDay_merged.csv".to_string(),
            row: 0,
        };
        assert_eq!(
            err.to_string(),
            "Invalid timestamp \"13/45/2016\" in sleepDay_merged.csv (row 0)"
        );
    }

    #[test]
    fn test_error_display_invalid_range() {
        let err = FitdashError::InvalidRange {
            start: "2024-03-02".to_string(),
            end: "2024-03-01".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid range: start 2024-03-02 is after end 2024-03-01"
        );
    }

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = FitdashError::FileRead {
            path: PathBuf::from("/data/Folder_1/x.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/Folder_1/x.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_config() {
        let err = FitdashError::Config("duplicate mapping for hour/steps".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: duplicate mapping for hour/steps"
        );
    }

    #[test]
    fn test_error_display_data_path_not_found() {
        let err = FitdashError::DataPathNotFound(PathBuf::from("/missing/dir"));
        assert_eq!(err.to_string(), "Data path not found: /missing/dir");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: FitdashError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: FitdashError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[test]
    fn test_record_level_classification() {
        let id = FitdashError::InvalidIdentifier {
            value: "x".to_string(),
            source_name: "s".to_string(),
            row: 0,
        };
        let range = FitdashError::InvalidRange {
            start: "a".to_string(),
            end: "b".to_string(),
        };
        assert!(id.is_record_level());
        assert!(!range.is_record_level());
    }
}
