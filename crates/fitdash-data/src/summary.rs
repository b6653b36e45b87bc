//! Descriptive statistics over a filtered view.

use fitdash_core::models::{MetricSummary, Reading, SummaryResult, TableView};
use serde::Serialize;

// ── Accumulator ───────────────────────────────────────────────────────────────

/// Running aggregates for one column.
///
/// Integer columns are summed exactly until the sum would overflow `i64`,
/// after which the sum continues as a decimal.
#[derive(Debug, Clone, Default)]
struct Accumulator {
    count: usize,
    sum: Option<Reading>,
    float_sum: f64,
    min: Option<Reading>,
    max: Option<Reading>,
}

impl Accumulator {
    fn add(&mut self, value: Reading) {
        self.count += 1;
        self.float_sum += value.as_f64();

        self.sum = Some(match (self.sum, value) {
            (None, v) => v,
            (Some(Reading::Integer(a)), Reading::Integer(b)) => match a.checked_add(b) {
                Some(s) => Reading::Integer(s),
                None => Reading::Decimal(a as f64 + b as f64),
            },
            (Some(acc), v) => Reading::Decimal(acc.as_f64() + v.as_f64()),
        });

        if self.min.map_or(true, |m| value.total_cmp(&m).is_lt()) {
            self.min = Some(value);
        }
        if self.max.map_or(true, |m| value.total_cmp(&m).is_gt()) {
            self.max = Some(value);
        }
    }

    fn finish(self) -> MetricSummary {
        if self.count == 0 {
            return MetricSummary::default();
        }
        MetricSummary {
            count: self.count,
            sum: self.sum,
            mean: Some(self.float_sum / self.count as f64),
            min: self.min,
            max: self.max,
        }
    }
}

// ── summarize ─────────────────────────────────────────────────────────────────

/// Per-column count, sum, mean, min and max for `view`.
///
/// "No reading" cells are skipped; a column without any reading gets a
/// zero count and `None` aggregates.
pub fn summarize(view: &TableView<'_>) -> SummaryResult {
    let mut accs = vec![Accumulator::default(); view.columns().len()];
    for row in view.rows() {
        for (acc, cell) in accs.iter_mut().zip(&row.values) {
            if let Some(value) = cell {
                acc.add(*value);
            }
        }
    }

    SummaryResult::new(
        view.columns()
            .iter()
            .cloned()
            .zip(accs.into_iter().map(Accumulator::finish))
            .collect(),
    )
}

// ── Headline ──────────────────────────────────────────────────────────────────

/// The handful of figures shown at the top of a dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Headline {
    pub total_steps: Option<Reading>,
    pub avg_steps: Option<f64>,
    pub total_minutes_asleep: Option<Reading>,
    pub avg_minutes_asleep: Option<f64>,
    pub avg_calories: Option<f64>,
}

impl Headline {
    pub fn from_summary(summary: &SummaryResult) -> Self {
        let get = |metric: &str| summary.get(metric);
        Self {
            total_steps: get("steps").and_then(|s| s.sum),
            avg_steps: get("steps").and_then(|s| s.mean),
            total_minutes_asleep: get("minutes_asleep").and_then(|s| s.sum),
            avg_minutes_asleep: get("minutes_asleep").and_then(|s| s.mean),
            avg_calories: get("calories").and_then(|s| s.mean),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
