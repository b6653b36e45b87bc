//! Schema normalization: raw per-file rows onto the canonical record shape.
//!
//! Each raw row expands into one [`NormalizedRecord`] per mapped metric
//! column. Ids, timestamps and values are parsed explicitly; failures are
//! collected per source into an [`IngestReport`] instead of being dropped or
//! coerced.

use std::collections::HashMap;

use fitdash_core::error::{FitdashError, Result};
use fitdash_core::models::{
    integral_f64, MetricFamily, MetricName, NormalizedRecord, RawRecord, RawSource, RawValue,
    Reading, Resolution, UserId,
};
use fitdash_core::schema::{MetricKind, SchemaMap, SourceMapping};
use fitdash_core::time_utils::TimestampParser;
use tracing::{debug, warn};

/// Column name reported when a source has no mapping entry at all.
pub const NO_MAPPING: &str = "<no mapping>";

// ── Reports ───────────────────────────────────────────────────────────────────

/// What happened to one source during normalization.
#[derive(Debug)]
pub struct SourceReport {
    pub source_name: String,
    pub resolution: Resolution,
    pub family: MetricFamily,
    pub rows_read: usize,
    /// Rows that produced no records because their id or timestamp failed.
    pub rows_rejected: usize,
    pub records_emitted: usize,
    /// Source-level (`SchemaMismatch`) and record-level failures, in row order.
    pub errors: Vec<FitdashError>,
}

impl SourceReport {
    fn new(source: &RawSource) -> Self {
        Self {
            source_name: source.name.clone(),
            resolution: source.resolution,
            family: source.family,
            rows_read: source.records.len(),
            rows_rejected: 0,
            records_emitted: 0,
            errors: Vec::new(),
        }
    }

    /// `true` when the whole source was rejected for a schema mismatch.
    pub fn is_rejected(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, FitdashError::SchemaMismatch { .. }))
    }
}

/// Aggregate failure report across every source, in processing order.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub sources: Vec<SourceReport>,
}

impl IngestReport {
    /// Every failure paired with the source that produced it.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &FitdashError)> {
        self.sources
            .iter()
            .flat_map(|s| s.errors.iter().map(move |e| (s.source_name.as_str(), e)))
    }

    pub fn error_count(&self) -> usize {
        self.sources.iter().map(|s| s.errors.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.error_count() == 0
    }

    pub fn rejected_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| s.is_rejected())
    }

    pub fn records_emitted(&self) -> usize {
        self.sources.iter().map(|s| s.records_emitted).sum()
    }
}

/// Normalized records plus the report describing how they were obtained.
#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    pub records: Vec<NormalizedRecord>,
    pub report: IngestReport,
}

// ── SchemaNormalizer ──────────────────────────────────────────────────────────

/// Applies a [`SchemaMap`] to raw sources.
pub struct SchemaNormalizer<'a> {
    schema: &'a SchemaMap,
    parser: TimestampParser,
}

/// Source header names resolved for one mapping.
struct ResolvedColumns<'m> {
    id: String,
    time: String,
    values: Vec<(String, &'m str, MetricKind, &'m MetricName)>,
}

impl<'a> SchemaNormalizer<'a> {
    /// Fails only when the schema's timezone is unusable.
    pub fn new(schema: &'a SchemaMap) -> Result<Self> {
        Ok(Self {
            schema,
            parser: schema.timestamp_parser()?,
        })
    }

    /// Normalize every source in order. Never fails; see the report.
    pub fn normalize(&self, sources: &[RawSource]) -> NormalizeOutcome {
        let mut outcome = NormalizeOutcome::default();
        for source in sources {
            let (records, report) = self.normalize_source(source);
            outcome.records.extend(records);
            outcome.report.sources.push(report);
        }
        debug!(
            "Normalized {} records from {} sources ({} failures)",
            outcome.records.len(),
            sources.len(),
            outcome.report.error_count()
        );
        outcome
    }

    /// Normalize one source; a schema mismatch yields no records.
    pub fn normalize_source(&self, source: &RawSource) -> (Vec<NormalizedRecord>, SourceReport) {
        let mut report = SourceReport::new(source);

        let columns = match self
            .schema
            .mapping(source.resolution, source.family)
            .ok_or_else(|| FitdashError::SchemaMismatch {
                source_name: source.name.clone(),
                column: NO_MAPPING.to_string(),
            })
            .and_then(|mapping| resolve_columns(source, mapping))
        {
            Ok(columns) => columns,
            Err(e) => {
                warn!("Skipping source: {}", e);
                report.errors.push(e);
                return (Vec::new(), report);
            }
        };

        let mut records = Vec::new();
        for (row, raw) in source.records.iter().enumerate() {
            match self.normalize_row(source, &columns, row, raw, &mut records) {
                Ok(()) => {}
                Err(errors) => {
                    report.errors.extend(errors);
                }
            }
        }

        report.rows_rejected = count_rejected_rows(&report.errors);
        report.records_emitted = records.len();

        if report.errors.is_empty() {
            debug!(
                "Source {}: {} rows, {} records",
                source.name, report.rows_read, report.records_emitted
            );
        } else {
            warn!(
                "Source {}: {} rows, {} records, {} failures",
                source.name,
                report.rows_read,
                report.records_emitted,
                report.errors.len()
            );
        }

        (records, report)
    }

    /// Expand one row. Value failures still let the row's other metrics
    /// through; id or timestamp failures reject the whole row.
    fn normalize_row(
        &self,
        source: &RawSource,
        columns: &ResolvedColumns<'_>,
        row: usize,
        raw: &RawRecord,
        out: &mut Vec<NormalizedRecord>,
    ) -> std::result::Result<(), Vec<FitdashError>> {
        let mut errors = Vec::new();

        let id_cell = raw.get(&columns.id).cloned().unwrap_or_default();
        let user_id = parse_user_id(&id_cell);
        if user_id.is_none() {
            errors.push(FitdashError::InvalidIdentifier {
                value: id_cell.to_string(),
                source_name: source.name.clone(),
                row,
            });
        }

        let time_cell = raw.get(&columns.time).cloned().unwrap_or_default();
        let timestamp = self.parse_timestamp(&time_cell, source.resolution);
        if timestamp.is_none() {
            errors.push(FitdashError::InvalidTimestamp {
                value: time_cell.to_string(),
                source_name: source.name.clone(),
                row,
            });
        }

        let (Some(user_id), Some(timestamp)) = (user_id, timestamp) else {
            return Err(errors);
        };

        for (header, column, kind, metric) in &columns.values {
            let cell = raw.get(header).cloned().unwrap_or_default();
            if cell.is_empty() {
                continue;
            }
            match parse_reading(&cell, *kind) {
                Some(value) => out.push(NormalizedRecord {
                    user_id,
                    timestamp,
                    resolution: source.resolution,
                    family: source.family,
                    metric: (*metric).clone(),
                    value,
                }),
                None => errors.push(FitdashError::InvalidValue {
                    value: cell.to_string(),
                    column: column.to_string(),
                    source_name: source.name.clone(),
                    row,
                }),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn parse_timestamp(
        &self,
        cell: &RawValue,
        resolution: Resolution,
    ) -> Option<chrono::DateTime<chrono::Utc>> {
        match cell {
            RawValue::Text(s) => self.parser.parse(s, resolution),
            RawValue::Integer(secs) => self.parser.from_unix(*secs, resolution),
            RawValue::Decimal(_) | RawValue::Empty => None,
        }
    }
}

/// Convenience wrapper: build a normalizer for `schema` and run it.
pub fn normalize(schema: &SchemaMap, sources: &[RawSource]) -> Result<NormalizeOutcome> {
    Ok(SchemaNormalizer::new(schema)?.normalize(sources))
}

// ── Parsing helpers ───────────────────────────────────────────────────────────

/// Parse a user id cell. Total: every input maps to `Some` or `None`.
pub fn parse_user_id(cell: &RawValue) -> Option<UserId> {
    match cell {
        RawValue::Integer(i) => Some(UserId(*i)),
        RawValue::Decimal(d) => integral_f64(*d).map(UserId),
        RawValue::Text(s) => UserId::parse(s),
        RawValue::Empty => None,
    }
}

/// Parse a metric cell into `kind`. Non-finite numbers are rejected.
pub fn parse_reading(cell: &RawValue, kind: MetricKind) -> Option<Reading> {
    match (kind, cell) {
        (_, RawValue::Empty) => None,
        (MetricKind::Integer, RawValue::Integer(i)) => Some(Reading::Integer(*i)),
        (MetricKind::Integer, RawValue::Decimal(d)) => integral_f64(*d).map(Reading::Integer),
        (MetricKind::Integer, RawValue::Text(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_f64))
                .map(Reading::Integer)
        }
        (MetricKind::Decimal, RawValue::Integer(i)) => Some(Reading::Decimal(*i as f64)),
        (MetricKind::Decimal, RawValue::Decimal(d)) => {
            d.is_finite().then_some(Reading::Decimal(*d))
        }
        (MetricKind::Decimal, RawValue::Text(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .map(Reading::Decimal),
    }
}

/// Match mapping columns against the source header case-insensitively.
///
/// A wanted column that matches more than one header is ambiguous and
/// rejects the source like a missing one.
fn resolve_columns<'m>(
    source: &RawSource,
    mapping: &'m SourceMapping,
) -> Result<ResolvedColumns<'m>> {
    let mut header: HashMap<String, Vec<&str>> = HashMap::new();
    for c in &source.columns {
        header.entry(c.trim().to_lowercase()).or_default().push(c.as_str());
    }

    let find = |wanted: &str| -> Result<String> {
        let mismatch = |column: String| FitdashError::SchemaMismatch {
            source_name: source.name.clone(),
            column,
        };
        match header.get(&wanted.trim().to_lowercase()).map(Vec::as_slice) {
            Some([single]) => Ok(single.to_string()),
            Some(several) if several.len() > 1 => Err(mismatch(format!(
                "{wanted} (ambiguous: {})",
                several.join(", ")
            ))),
            _ => Err(mismatch(wanted.to_string())),
        }
    };

    let id = find(&mapping.id_column)?;
    let time = find(&mapping.time_column)?;
    let values = mapping
        .value_columns
        .iter()
        .map(|vc| Ok((find(&vc.column)?, vc.column.as_str(), vc.kind, &vc.metric)))
        .collect::<Result<Vec<_>>>()?;

    Ok(ResolvedColumns { id, time, values })
}

/// Rows with an id or timestamp failure; a row can report both.
fn count_rejected_rows(errors: &[FitdashError]) -> usize {
    let mut rows: Vec<usize> = errors
        .iter()
        .filter_map(|e| match e {
            FitdashError::InvalidIdentifier { row, .. }
            | FitdashError::InvalidTimestamp { row, .. } => Some(*row),
            _ => None,
        })
        .collect();
    rows.dedup();
    rows.len()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
