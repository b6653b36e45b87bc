//! Resolution unification: pivot normalized records into one canonical
//! table per resolution.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fitdash_core::models::{CanonicalTable, MetricName, NormalizedRecord, Resolution, Row, UserId};
use serde::Serialize;
use tracing::{debug, warn};

/// Maximum number of colliding keys kept as samples.
pub const COLLISION_SAMPLE_LIMIT: usize = 32;

// ── Collisions ────────────────────────────────────────────────────────────────

/// A `(user, timestamp, metric)` entry that was supplied more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollisionKey {
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub metric: MetricName,
}

/// Overwrites observed while building one table. Not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollisionDiagnostic {
    /// Total number of overwritten entries.
    pub count: usize,
    /// First [`COLLISION_SAMPLE_LIMIT`] colliding keys.
    pub samples: Vec<CollisionKey>,
}

impl CollisionDiagnostic {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn record(&mut self, key: CollisionKey) {
        self.count += 1;
        if self.samples.len() < COLLISION_SAMPLE_LIMIT {
            self.samples.push(key);
        }
    }
}

/// A built table and the collisions found while building it.
#[derive(Debug, Clone)]
pub struct Unified {
    pub table: CanonicalTable,
    pub collisions: CollisionDiagnostic,
}

// ── ResolutionUnifier ─────────────────────────────────────────────────────────

/// Builds the canonical table for one resolution.
#[derive(Debug, Clone)]
pub struct ResolutionUnifier {
    resolution: Resolution,
    declared: Vec<MetricName>,
}

impl ResolutionUnifier {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            declared: Vec::new(),
        }
    }

    /// Columns that must exist even when no record carries them.
    pub fn with_columns(mut self, declared: Vec<MetricName>) -> Self {
        self.declared = declared;
        self
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Pivot `records` into rows keyed by `(user_id, timestamp)`.
    ///
    /// Records at other resolutions are ignored. Rows appear in
    /// first-appearance order and a repeated `(user, timestamp, metric)`
    /// overwrites the earlier value.
    pub fn unify(&self, records: &[NormalizedRecord]) -> Unified {
        let relevant: Vec<&NormalizedRecord> = records
            .iter()
            .filter(|r| r.resolution == self.resolution)
            .collect();
        let skipped = records.len() - relevant.len();
        if skipped > 0 {
            debug!(
                "{} unifier: ignoring {} records at other resolutions",
                self.resolution, skipped
            );
        }

        // Settle the column set before any row is materialized.
        let mut columns = self.declared.clone();
        for record in &relevant {
            if !columns.contains(&record.metric) {
                columns.push(record.metric.clone());
            }
        }
        let column_index: HashMap<&MetricName, usize> =
            columns.iter().enumerate().map(|(i, m)| (m, i)).collect();

        let mut rows: Vec<Row> = Vec::new();
        let mut row_index: HashMap<(UserId, DateTime<Utc>), usize> = HashMap::new();
        let mut collisions = CollisionDiagnostic::default();

        for record in relevant {
            let key = (record.user_id, record.timestamp);
            let idx = *row_index.entry(key).or_insert_with(|| {
                rows.push(Row {
                    user_id: record.user_id,
                    timestamp: record.timestamp,
                    values: vec![None; columns.len()],
                });
                rows.len() - 1
            });

            // Every record metric was added to `columns` above.
            let Some(&col) = column_index.get(&record.metric) else {
                continue;
            };
            let cell = &mut rows[idx].values[col];
            if cell.is_some() {
                collisions.record(CollisionKey {
                    user_id: record.user_id,
                    timestamp: record.timestamp,
                    metric: record.metric.clone(),
                });
            }
            *cell = Some(record.value);
        }

        if !collisions.is_empty() {
            warn!(
                "{} table: {} overwritten entries (last write wins)",
                self.resolution, collisions.count
            );
        }
        debug!(
            "{} table: {} rows x {} columns",
            self.resolution,
            rows.len(),
            columns.len()
        );

        drop(column_index);
        Unified {
            table: CanonicalTable::from_parts(self.resolution, columns, rows),
            collisions,
        }
    }
}

/// Unify `records` at `resolution` using only the observed metric names.
pub fn unify(records: &[NormalizedRecord], resolution: Resolution) -> Unified {
    ResolutionUnifier::new(resolution).unify(records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
