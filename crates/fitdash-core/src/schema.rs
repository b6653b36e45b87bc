//! Column-mapping configuration.
//!
//! A [`SchemaMap`] states, for every `(resolution, metric family)` pair,
//! which source columns hold the user id, the timestamp and the metric
//! values. It is plain data: it deserializes from JSON so new source
//! layouts can be supported by editing a file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FitdashError, Result};
use crate::models::{MetricFamily, MetricName, Resolution};
use crate::time_utils::TimestampParser;

// ── Types ─────────────────────────────────────────────────────────────────────

/// Native numeric type of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Integer,
    #[default]
    Decimal,
}

/// One source column and the canonical metric it feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueColumn {
    pub column: String,
    pub metric: MetricName,
    #[serde(default)]
    pub kind: MetricKind,
}

/// Mapping for one `(resolution, family)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceMapping {
    pub resolution: Resolution,
    pub family: MetricFamily,
    /// Regex matched against a file stem by loaders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_pattern: Option<String>,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    pub time_column: String,
    pub value_columns: Vec<ValueColumn>,
}

impl SourceMapping {
    pub fn metrics(&self) -> impl Iterator<Item = &MetricName> {
        self.value_columns.iter().map(|v| &v.metric)
    }
}

/// The full mapping table plus the timestamp convention shared by every
/// source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaMap {
    /// IANA timezone naive source timestamps are written in.
    #[serde(default = "default_timezone")]
    pub source_timezone: String,
    /// Overrides the built-in timestamp formats when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_formats: Vec<String>,
    pub sources: Vec<SourceMapping>,
}

fn default_id_column() -> String {
    "Id".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for SchemaMap {
    fn default() -> Self {
        Self::fitbit()
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl SchemaMap {
    /// Default location of a user-supplied mapping: `~/.fitdash/schema.json`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fitdash")
            .join("schema.json")
    }

    /// Parse and validate a JSON mapping.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let schema: SchemaMap = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Read and validate a mapping file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| FitdashError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Load `path` when it exists, otherwise fall back to [`SchemaMap::fitbit`].
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading schema mapping from {}", path.display());
            Self::load_from(path)
        } else {
            debug!(
                "No schema mapping at {}, using built-in Fitbit layout",
                path.display()
            );
            Ok(Self::fitbit())
        }
    }

    /// Check the table for duplicate pairs, empty mappings, bad regexes and
    /// an unknown timezone.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<(Resolution, MetricFamily)> = HashSet::new();
        for mapping in &self.sources {
            let key = (mapping.resolution, mapping.family);
            if !seen.insert(key) {
                return Err(FitdashError::Config(format!(
                    "duplicate mapping for {}/{}",
                    mapping.resolution, mapping.family
                )));
            }
            if mapping.value_columns.is_empty() {
                return Err(FitdashError::Config(format!(
                    "mapping for {}/{} has no value columns",
                    mapping.resolution, mapping.family
                )));
            }
            let mut metrics: HashSet<&str> = HashSet::new();
            for vc in &mapping.value_columns {
                if !metrics.insert(vc.metric.as_str()) {
                    return Err(FitdashError::Config(format!(
                        "mapping for {}/{} declares metric {} twice",
                        mapping.resolution, mapping.family, vc.metric
                    )));
                }
            }
            if let Some(pattern) = &mapping.file_pattern {
                Regex::new(pattern).map_err(|e| {
                    FitdashError::Config(format!("invalid file pattern {pattern:?}: {e}"))
                })?;
            }
        }
        self.timestamp_parser().map(|_| ())
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    pub fn mapping(&self, resolution: Resolution, family: MetricFamily) -> Option<&SourceMapping> {
        self.sources
            .iter()
            .find(|m| m.resolution == resolution && m.family == family)
    }

    /// Every mapping at `resolution`, in declaration order.
    pub fn mappings_for(&self, resolution: Resolution) -> impl Iterator<Item = &SourceMapping> {
        self.sources.iter().filter(move |m| m.resolution == resolution)
    }

    /// Column vocabulary for `resolution` restricted to `families`, in
    /// declaration order without duplicates.
    pub fn declared_metrics(
        &self,
        resolution: Resolution,
        families: &HashSet<MetricFamily>,
    ) -> Vec<MetricName> {
        let mut out: Vec<MetricName> = Vec::new();
        for mapping in self.mappings_for(resolution) {
            if !families.contains(&mapping.family) {
                continue;
            }
            for metric in mapping.metrics() {
                if !out.contains(metric) {
                    out.push(metric.clone());
                }
            }
        }
        out
    }

    /// Parser configured with this mapping's timezone and formats.
    pub fn timestamp_parser(&self) -> Result<TimestampParser> {
        TimestampParser::new(&self.source_timezone, self.time_formats.clone())
    }

    // ── Built-in layout ───────────────────────────────────────────────────────

    /// Layout of the public Fitbit export (`*_merged.csv` files).
    pub fn fitbit() -> Self {
        use MetricKind::{Decimal, Integer};

        let minute = |family, pattern: &str, time: &str, values| SourceMapping {
            resolution: Resolution::Minute,
            family,
            file_pattern: Some(pattern.to_string()),
            id_column: default_id_column(),
            time_column: time.to_string(),
            value_columns: values,
        };
        let hour = |family, pattern: &str, values| SourceMapping {
            resolution: Resolution::Hour,
            family,
            file_pattern: Some(pattern.to_string()),
            id_column: default_id_column(),
            time_column: "ActivityHour".to_string(),
            value_columns: values,
        };
        let day = |family, pattern: &str, time: &str, values| SourceMapping {
            resolution: Resolution::Day,
            family,
            file_pattern: Some(pattern.to_string()),
            id_column: default_id_column(),
            time_column: time.to_string(),
            value_columns: values,
        };

        Self {
            source_timezone: default_timezone(),
            time_formats: Vec::new(),
            sources: vec![
                minute(
                    MetricFamily::Calories,
                    "^minuteCaloriesNarrow",
                    "ActivityMinute",
                    vec![col("Calories", "calories", Decimal)],
                ),
                minute(
                    MetricFamily::Intensity,
                    "^minuteIntensitiesNarrow",
                    "ActivityMinute",
                    vec![col("Intensity", "intensity", Integer)],
                ),
                minute(
                    MetricFamily::Mets,
                    "^minuteMETsNarrow",
                    "ActivityMinute",
                    vec![col("METs", "mets", Integer)],
                ),
                minute(
                    MetricFamily::Steps,
                    "^minuteStepsNarrow",
                    "ActivityMinute",
                    vec![col("Steps", "steps", Integer)],
                ),
                minute(
                    MetricFamily::Sleep,
                    "^minuteSleep",
                    "date",
                    vec![col("value", "sleep_stage", Integer)],
                ),
                hour(
                    MetricFamily::Calories,
                    "^hourlyCalories",
                    vec![col("Calories", "calories", Decimal)],
                ),
                hour(
                    MetricFamily::Intensity,
                    "^hourlyIntensities",
                    vec![
                        col("TotalIntensity", "total_intensity", Integer),
                        col("AverageIntensity", "average_intensity", Decimal),
                    ],
                ),
                hour(
                    MetricFamily::Steps,
                    "^hourlySteps",
                    vec![col("StepTotal", "steps", Integer)],
                ),
                day(
                    MetricFamily::Activity,
                    "^dailyActivity",
                    "ActivityDate",
                    vec![
                        col("TotalSteps", "steps", Integer),
                        col("TotalDistance", "total_distance", Decimal),
                        col("TrackerDistance", "tracker_distance", Decimal),
                        col("LoggedActivitiesDistance", "logged_activities_distance", Decimal),
                        col("VeryActiveDistance", "very_active_distance", Decimal),
                        col("ModeratelyActiveDistance", "moderately_active_distance", Decimal),
                        col("LightActiveDistance", "light_active_distance", Decimal),
                        col("SedentaryActiveDistance", "sedentary_active_distance", Decimal),
                        col("VeryActiveMinutes", "very_active_minutes", Integer),
                        col("FairlyActiveMinutes", "fairly_active_minutes", Integer),
                        col("LightlyActiveMinutes", "lightly_active_minutes", Integer),
                        col("SedentaryMinutes", "sedentary_minutes", Integer),
                        col("Calories", "calories", Decimal),
                    ],
                ),
                day(
                    MetricFamily::Sleep,
                    "^sleepDay",
                    "SleepDay",
                    vec![
                        col("TotalSleepRecords", "total_sleep_records", Integer),
                        col("TotalMinutesAsleep", "minutes_asleep", Integer),
                        col("TotalTimeInBed", "time_in_bed", Integer),
                    ],
                ),
                day(
                    MetricFamily::Weight,
                    "^weightLogInfo",
                    "Date",
                    vec![
                        col("WeightKg", "weight_kg", Decimal),
                        col("WeightPounds", "weight_pounds", Decimal),
                        col("Fat", "fat", Decimal),
                        col("BMI", "bmi", Decimal),
                    ],
                ),
            ],
        }
    }
}

fn col(column: &str, metric: &str, kind: MetricKind) -> ValueColumn {
    ValueColumn {
        column: column.to_string(),
        metric: MetricName::from(metric),
        kind,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
