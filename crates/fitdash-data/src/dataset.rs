//! The immutable, explicitly constructed dataset context.
//!
//! A [`Dataset`] is built once from raw sources: normalize, then unify at
//! every resolution. After that it is read-only; every query borrows it.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use fitdash_core::error::Result;
use fitdash_core::models::{
    CanonicalTable, FilterSpec, MetricFamily, RawSource, Resolution, SummaryResult, TableView,
    UserId,
};
use fitdash_core::schema::SchemaMap;
use tracing::info;

use crate::filter;
use crate::normalizer::{IngestReport, SchemaNormalizer};
use crate::summary;
use crate::unifier::{CollisionDiagnostic, ResolutionUnifier};

/// Three canonical tables plus everything learned while building them.
#[derive(Debug)]
pub struct Dataset {
    tables: HashMap<Resolution, CanonicalTable>,
    collisions: HashMap<Resolution, CollisionDiagnostic>,
    report: IngestReport,
    built_at: DateTime<Utc>,
}

impl Dataset {
    /// Run the full pipeline over `sources`.
    ///
    /// Bad rows and mismatched sources never fail the build; they end up in
    /// [`Dataset::report`]. Only an unusable schema timezone is an error.
    pub fn build(schema: &SchemaMap, sources: &[RawSource]) -> Result<Self> {
        let start = std::time::Instant::now();

        let outcome = SchemaNormalizer::new(schema)?.normalize(sources);

        let mut tables = HashMap::new();
        let mut collisions = HashMap::new();
        for resolution in Resolution::ALL {
            // Families whose sources made it past the schema check get every
            // column their mapping declares, even when all cells are empty.
            let families: HashSet<MetricFamily> = outcome
                .report
                .sources
                .iter()
                .filter(|s| s.resolution == resolution && !s.is_rejected())
                .map(|s| s.family)
                .collect();
            let declared = schema.declared_metrics(resolution, &families);

            let unified = ResolutionUnifier::new(resolution)
                .with_columns(declared)
                .unify(&outcome.records);
            tables.insert(resolution, unified.table);
            collisions.insert(resolution, unified.collisions);
        }

        let dataset = Self {
            tables,
            collisions,
            report: outcome.report,
            built_at: Utc::now(),
        };

        info!(
            "Built dataset from {} sources in {:.2}s: {} minute, {} hour, {} day rows ({} ingest failures)",
            sources.len(),
            start.elapsed().as_secs_f64(),
            dataset.table(Resolution::Minute).len(),
            dataset.table(Resolution::Hour).len(),
            dataset.table(Resolution::Day).len(),
            dataset.report.error_count()
        );

        Ok(dataset)
    }

    /// A dataset with three empty tables.
    pub fn empty() -> Self {
        Self {
            tables: Resolution::ALL
                .into_iter()
                .map(|r| (r, CanonicalTable::empty(r)))
                .collect(),
            collisions: HashMap::new(),
            report: IngestReport::default(),
            built_at: Utc::now(),
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// The canonical table at `resolution`.
    pub fn table(&self, resolution: Resolution) -> &CanonicalTable {
        // Every constructor fills all three resolutions.
        &self.tables[&resolution]
    }

    /// Filter the table selected by `spec.resolution`.
    pub fn filter(&self, spec: &FilterSpec) -> Result<TableView<'_>> {
        filter::filter(self.table(spec.resolution), spec)
    }

    /// Filter, then summarize the resulting view.
    pub fn summarize(&self, spec: &FilterSpec) -> Result<SummaryResult> {
        Ok(summary::summarize(&self.filter(spec)?))
    }

    pub fn collisions(&self, resolution: Resolution) -> Option<&CollisionDiagnostic> {
        self.collisions.get(&resolution)
    }

    /// Total overwritten entries across all tables.
    pub fn collision_count(&self) -> usize {
        self.collisions.values().map(|c| c.count).sum()
    }

    pub fn report(&self) -> &IngestReport {
        &self.report
    }

    /// Sorted distinct user ids across every table.
    pub fn user_ids(&self) -> Vec<UserId> {
        let ids: BTreeSet<UserId> = self
            .tables
            .values()
            .flat_map(|t| t.rows().iter().map(|r| r.user_id))
            .collect();
        ids.into_iter().collect()
    }

    pub fn time_bounds(&self, resolution: Resolution) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.table(resolution).time_bounds()
    }

    /// When this dataset finished building.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
