use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{FitdashError, Result};

// ── Resolution ────────────────────────────────────────────────────────────────

/// Native sampling granularity of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Minute,
    Hour,
    Day,
}

impl Resolution {
    /// All resolutions, finest first.
    pub const ALL: [Resolution; 3] = [Resolution::Minute, Resolution::Hour, Resolution::Day];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Minute => "minute",
            Resolution::Hour => "hour",
            Resolution::Day => "day",
        }
    }

    /// Length of one unit at this resolution.
    pub fn step(&self) -> Duration {
        match self {
            Resolution::Minute => Duration::minutes(1),
            Resolution::Hour => Duration::hours(1),
            Resolution::Day => Duration::days(1),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = FitdashError;

    /// Accepts `minute(s)`, `hour(ly)` and `day`/`daily`, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "minute" | "minutes" => Ok(Resolution::Minute),
            "hour" | "hourly" => Ok(Resolution::Hour),
            "day" | "daily" => Ok(Resolution::Day),
            other => Err(FitdashError::Config(format!("unknown resolution: {other}"))),
        }
    }
}

// ── MetricFamily ──────────────────────────────────────────────────────────────

/// Category of source export contributing one or more metric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricFamily {
    Activity,
    Sleep,
    Calories,
    Intensity,
    Steps,
    Mets,
    Weight,
}

impl MetricFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricFamily::Activity => "activity",
            MetricFamily::Sleep => "sleep",
            MetricFamily::Calories => "calories",
            MetricFamily::Intensity => "intensity",
            MetricFamily::Steps => "steps",
            MetricFamily::Mets => "mets",
            MetricFamily::Weight => "weight",
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricFamily {
    type Err = FitdashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "activity" => Ok(MetricFamily::Activity),
            "sleep" => Ok(MetricFamily::Sleep),
            "calories" => Ok(MetricFamily::Calories),
            "intensity" => Ok(MetricFamily::Intensity),
            "steps" => Ok(MetricFamily::Steps),
            "mets" => Ok(MetricFamily::Mets),
            "weight" => Ok(MetricFamily::Weight),
            other => Err(FitdashError::Config(format!("unknown metric family: {other}"))),
        }
    }
}

// ── Identifiers ───────────────────────────────────────────────────────────────

/// Stable integer user identifier shared by every source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Parse a textual identifier.
    ///
    /// Accepts plain integers with surrounding whitespace and integral
    /// decimals such as `"1503960366.0"` (spreadsheet exports). Exponents,
    /// fractions and anything else return `None`; there is no fallback value.
    pub fn parse(s: &str) -> Option<UserId> {
        let trimmed = s.trim();
        let (int_part, fraction) = match trimmed.split_once('.') {
            Some((int_part, fraction)) => (int_part, Some(fraction)),
            None => (trimmed, None),
        };
        if let Some(fraction) = fraction {
            if fraction.is_empty() || !fraction.bytes().all(|b| b == b'0') {
                return None;
            }
        }
        let digits = int_part.strip_prefix('-').unwrap_or(int_part);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        int_part.parse::<i64>().ok().map(UserId)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical metric column name, e.g. `"steps"` or `"minutes_asleep"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricName(String);

impl MetricName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MetricName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Values ────────────────────────────────────────────────────────────────────

/// A metric value in its native numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Integer(i64),
    Decimal(f64),
}

impl Reading {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Reading::Integer(i) => i as f64,
            Reading::Decimal(d) => d,
        }
    }

    /// Total order used for min/max: exact for two integers, IEEE total
    /// order otherwise.
    pub fn total_cmp(&self, other: &Reading) -> Ordering {
        match (self, other) {
            (Reading::Integer(a), Reading::Integer(b)) => a.cmp(b),
            _ => self.as_f64().total_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Integer(i) => write!(f, "{i}"),
            Reading::Decimal(d) => write!(f, "{d}"),
        }
    }
}

/// A single cell as handed over by a loader.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    #[default]
    Empty,
    Text(String),
    Integer(i64),
    Decimal(f64),
}

impl RawValue {
    /// Wrap a textual cell; blank cells become [`RawValue::Empty`].
    pub fn from_cell(cell: &str) -> Self {
        if cell.trim().is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(cell.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Empty => Ok(()),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Integer(i) => write!(f, "{i}"),
            RawValue::Decimal(d) => write!(f, "{d}"),
        }
    }
}

/// 2^53: above this an `f64` no longer holds every integer exactly.
pub const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// `Some(i)` when `f` is finite, has no fractional part and is small enough
/// that no neighbouring integer rounds to the same value.
pub fn integral_f64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_F64_INT {
        Some(f as i64)
    } else {
        None
    }
}

// ── Raw input ─────────────────────────────────────────────────────────────────

/// One row of one source: column name → cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: HashMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, value: RawValue) -> Self {
        self.fields.insert(column.into(), value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.fields.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, RawValue)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, RawValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A batch of raw records read from one file, tagged with the resolution
/// and metric family it was declared as.
#[derive(Debug, Clone)]
pub struct RawSource {
    /// Identity used in error reports, usually the file name.
    pub name: String,
    pub resolution: Resolution,
    pub family: MetricFamily,
    /// Header as it appeared in the source, in order.
    pub columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawSource {
    pub fn new(
        name: impl Into<String>,
        resolution: Resolution,
        family: MetricFamily,
        columns: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            resolution,
            family,
            columns,
            records: Vec::new(),
        }
    }

    /// Build a source whose header is the union of the records' columns,
    /// in first-seen order (sorted within each record).
    pub fn from_records(
        name: impl Into<String>,
        resolution: Resolution,
        family: MetricFamily,
        records: Vec<RawRecord>,
    ) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            let mut cols: Vec<&str> = record.columns().collect();
            cols.sort_unstable();
            for col in cols {
                if !columns.iter().any(|c| c == col) {
                    columns.push(col.to_string());
                }
            }
        }
        Self {
            name: name.into(),
            resolution,
            family,
            columns,
            records,
        }
    }

    pub fn push(&mut self, record: RawRecord) {
        self.records.push(record);
    }
}

// ── Normalized records ────────────────────────────────────────────────────────

/// One metric observation on the canonical schema.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub user_id: UserId,
    /// UTC instant truncated to `resolution`.
    pub timestamp: DateTime<Utc>,
    pub resolution: Resolution,
    pub family: MetricFamily,
    pub metric: MetricName,
    pub value: Reading,
}

// ── Canonical table ───────────────────────────────────────────────────────────

/// One `(user, timestamp)` row; `values[i]` belongs to column `i` of the
/// owning table and `None` means "no reading".
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub values: Vec<Option<Reading>>,
}

/// Unified, schema-stable table for one resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTable {
    resolution: Resolution,
    columns: Vec<MetricName>,
    rows: Vec<Row>,
}

impl CanonicalTable {
    /// Assemble a table. Every row must carry exactly one cell per column.
    pub fn from_parts(resolution: Resolution, columns: Vec<MetricName>, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|r| r.values.len() == columns.len()));
        Self {
            resolution,
            columns,
            rows,
        }
    }

    pub fn empty(resolution: Resolution) -> Self {
        Self::from_parts(resolution, Vec::new(), Vec::new())
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn columns(&self) -> &[MetricName] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, metric: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.as_str() == metric)
    }

    /// Borrowed view over every row.
    pub fn view(&self) -> TableView<'_> {
        TableView {
            resolution: self.resolution,
            columns: &self.columns,
            rows: self.rows.iter().collect(),
        }
    }

    /// Earliest and latest row timestamps, or `None` for an empty table.
    pub fn time_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.view().time_bounds()
    }
}

/// Read-only subset of a [`CanonicalTable`] with the same schema.
#[derive(Debug, Clone)]
pub struct TableView<'a> {
    resolution: Resolution,
    columns: &'a [MetricName],
    rows: Vec<&'a Row>,
}

impl<'a> TableView<'a> {
    /// Build a view from rows already known to belong to a table with
    /// `columns`.
    pub fn from_rows(resolution: Resolution, columns: &'a [MetricName], rows: Vec<&'a Row>) -> Self {
        Self {
            resolution,
            columns,
            rows,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn columns(&self) -> &'a [MetricName] {
        self.columns
    }

    pub fn rows(&self) -> &[&'a Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, metric: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.as_str() == metric)
    }

    /// Present values of one column, in row order.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = Reading> + '_ {
        self.rows.iter().filter_map(move |r| r.values.get(index).copied().flatten())
    }

    pub fn time_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let min = self.rows.iter().map(|r| r.timestamp).min()?;
        let max = self.rows.iter().map(|r| r.timestamp).max()?;
        Some((min, max))
    }

    /// Narrow this view further, keeping row order.
    pub fn filter(&self, spec: &FilterSpec) -> Result<TableView<'a>> {
        spec.validate()?;
        if spec.resolution != self.resolution {
            return Err(FitdashError::Config(format!(
                "filter for {} rows applied to a {} table",
                spec.resolution, self.resolution
            )));
        }
        Ok(TableView {
            resolution: self.resolution,
            columns: self.columns,
            rows: self.rows.iter().copied().filter(|r| spec.matches(r)).collect(),
        })
    }
}

// ── Filter spec ───────────────────────────────────────────────────────────────

/// Query parameters for one filter call. Built per query, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub resolution: Resolution,
    pub user_id: Option<UserId>,
    /// Inclusive lower bound.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end: Option<DateTime<Utc>>,
}

impl FilterSpec {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            user_id: None,
            start: None,
            end: None,
        }
    }

    pub fn user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Reject a range whose start lies after its end.
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(FitdashError::InvalidRange {
                    start: start.to_rfc3339(),
                    end: end.to_rfc3339(),
                });
            }
        }
        Ok(())
    }

    pub fn matches(&self, row: &Row) -> bool {
        if self.user_id.is_some_and(|u| u != row.user_id) {
            return false;
        }
        if self.start.is_some_and(|s| row.timestamp < s) {
            return false;
        }
        if self.end.is_some_and(|e| row.timestamp > e) {
            return false;
        }
        true
    }
}

// ── Summary ───────────────────────────────────────────────────────────────────

/// Descriptive aggregates for one metric column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricSummary {
    /// Number of present (non-"no reading") values.
    pub count: usize,
    pub sum: Option<Reading>,
    pub mean: Option<f64>,
    pub min: Option<Reading>,
    pub max: Option<Reading>,
}

/// Per-metric summaries in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryResult {
    entries: Vec<(MetricName, MetricSummary)>,
}

impl SummaryResult {
    pub fn new(entries: Vec<(MetricName, MetricSummary)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, metric: &str) -> Option<&MetricSummary> {
        self.entries
            .iter()
            .find(|(name, _)| name.as_str() == metric)
            .map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetricName, &MetricSummary)> {
        self.entries.iter().map(|(n, s)| (n, s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for SummaryResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, summary) in &self.entries {
            map.serialize_entry(name.as_str(), summary)?;
        }
        map.end()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn row(user: i64, t: DateTime<Utc>, values: Vec<Option<Reading>>) -> Row {
        Row {
            user_id: UserId(user),
            timestamp: t,
            values,
        }
    }

    // ── Resolution / MetricFamily ─────────────────────────────────────────────

    #[test]
    fn test_resolution_from_str_aliases() {
        assert_eq!("minutes".parse::<Resolution>().unwrap(), Resolution::Minute);
        assert_eq!("Hourly".parse::<Resolution>().unwrap(), Resolution::Hour);
        assert_eq!(" daily ".parse::<Resolution>().unwrap(), Resolution::Day);
        assert!("weekly".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_resolution_step() {
        assert_eq!(Resolution::Minute.step(), Duration::minutes(1));
        assert_eq!(Resolution::Day.step(), Duration::hours(24));
    }

    #[test]
    fn test_metric_family_round_trips_through_display() {
        for fam in [MetricFamily::Activity, MetricFamily::Mets, MetricFamily::Weight] {
            assert_eq!(fam.to_string().parse::<MetricFamily>().unwrap(), fam);
        }
    }

    // ── UserId ────────────────────────────────────────────────────────────────

    #[test]
    fn test_user_id_parse_variants() {
        assert_eq!(UserId::parse("1503960366"), Some(UserId(1503960366)));
        assert_eq!(UserId::parse("  42 "), Some(UserId(42)));
        assert_eq!(UserId::parse("1503960366.0"), Some(UserId(1503960366)));
        assert_eq!(UserId::parse("abc"), None);
        assert_eq!(UserId::parse("12.5"), None);
        assert_eq!(UserId::parse(""), None);
    }

    #[test]
    fn test_user_id_parse_never_rounds() {
        // Spreadsheet scientific notation loses digits.
        assert_eq!(UserId::parse("1.50396E+09"), None);
        assert_eq!(UserId::parse("1e3"), None);
        assert_eq!(UserId::parse("+5"), None);
        assert_eq!(UserId::parse("5."), None);
        assert_eq!(UserId::parse("0x1F"), None);
        assert_eq!(UserId::parse("99999999999999999999"), None);
        assert_eq!(
            UserId::parse("9007199254740993.0"),
            Some(UserId(9_007_199_254_740_993))
        );
        assert_eq!(UserId::parse("-7.00"), Some(UserId(-7)));
    }

    #[test]
    fn test_integral_f64_bounds() {
        assert_eq!(integral_f64(42.0), Some(42));
        assert_eq!(integral_f64(MAX_EXACT_F64_INT), Some(9_007_199_254_740_992));
        assert_eq!(integral_f64(MAX_EXACT_F64_INT * 2.0), None);
        assert_eq!(integral_f64(-1e17), None);
        assert_eq!(integral_f64(0.5), None);
        assert_eq!(integral_f64(f64::NAN), None);
    }

    #[test]
    fn test_user_id_parse_is_fixed_point() {
        let id = UserId(8877689391);
        assert_eq!(UserId::parse(&id.to_string()), Some(id));
    }

    // ── Reading ───────────────────────────────────────────────────────────────

    #[test]
    fn test_reading_total_cmp_mixed() {
        assert_eq!(
            Reading::Integer(3).total_cmp(&Reading::Decimal(2.5)),
            Ordering::Greater
        );
        assert_eq!(
            Reading::Integer(i64::MAX).total_cmp(&Reading::Integer(i64::MAX - 1)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_raw_value_from_cell() {
        assert_eq!(RawValue::from_cell("  "), RawValue::Empty);
        assert_eq!(RawValue::from_cell("12"), RawValue::Text("12".to_string()));
        assert!(RawValue::Text(" ".to_string()).is_empty());
    }

    #[test]
    fn test_raw_source_from_records_collects_columns() {
        let records = vec![
            RawRecord::new()
                .with("Id", RawValue::Integer(1))
                .with("Steps", RawValue::Integer(5)),
            RawRecord::new()
                .with("Id", RawValue::Integer(2))
                .with("ActivityMinute", RawValue::Empty),
        ];
        let src = RawSource::from_records("s", Resolution::Minute, MetricFamily::Steps, records);
        assert_eq!(src.columns, vec!["Id", "Steps", "ActivityMinute"]);
    }

    // ── CanonicalTable / TableView ────────────────────────────────────────────

    #[test]
    fn test_table_view_column_values_skip_no_reading() {
        let table = CanonicalTable::from_parts(
            Resolution::Day,
            vec![MetricName::from("steps")],
            vec![
                row(1, ts(2024, 3, 1, 0), vec![Some(Reading::Integer(10))]),
                row(1, ts(2024, 3, 2, 0), vec![None]),
            ],
        );
        let view = table.view();
        let vals: Vec<Reading> = view.column_values(0).collect();
        assert_eq!(vals, vec![Reading::Integer(10)]);
        assert_eq!(view.column_index("steps"), Some(0));
    }

    #[test]
    fn test_time_bounds() {
        let table = CanonicalTable::from_parts(
            Resolution::Hour,
            vec![],
            vec![
                row(1, ts(2024, 3, 1, 5), vec![]),
                row(2, ts(2024, 3, 1, 2), vec![]),
                row(1, ts(2024, 3, 1, 9), vec![]),
            ],
        );
        assert_eq!(
            table.time_bounds(),
            Some((ts(2024, 3, 1, 2), ts(2024, 3, 1, 9)))
        );
        assert!(CanonicalTable::empty(Resolution::Hour).time_bounds().is_none());
    }

    // ── FilterSpec ────────────────────────────────────────────────────────────

    #[test]
    fn test_filter_spec_validate_rejects_inverted_range() {
        let spec = FilterSpec::new(Resolution::Day)
            .start(ts(2024, 3, 2, 0))
            .end(ts(2024, 3, 1, 0));
        assert!(matches!(
            spec.validate(),
            Err(FitdashError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_filter_spec_equal_bounds_are_valid() {
        let spec = FilterSpec::new(Resolution::Day)
            .start(ts(2024, 3, 1, 0))
            .end(ts(2024, 3, 1, 0));
        assert!(spec.validate().is_ok());
        assert!(spec.matches(&row(7, ts(2024, 3, 1, 0), vec![])));
    }

    #[test]
    fn test_summary_result_serializes_as_map() {
        let result = SummaryResult::new(vec![(
            MetricName::from("steps"),
            MetricSummary {
                count: 1,
                sum: Some(Reading::Integer(5)),
                mean: Some(5.0),
                min: Some(Reading::Integer(5)),
                max: Some(Reading::Integer(5)),
            },
        )]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["steps"]["count"], 1);
        assert_eq!(json["steps"]["sum"], 5);
    }
}
