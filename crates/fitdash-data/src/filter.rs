//! Query/filter engine over canonical tables.
//!
//! Filtering never copies or mutates rows; the result borrows from the
//! table and keeps its row order.

use fitdash_core::error::Result;
use fitdash_core::models::{CanonicalTable, FilterSpec, TableView};
use tracing::debug;

/// Select the rows of `table` matching `spec`.
///
/// An inverted range fails with `InvalidRange` before any row is looked at;
/// a spec for a different resolution is a configuration error.
pub fn filter<'a>(table: &'a CanonicalTable, spec: &FilterSpec) -> Result<TableView<'a>> {
    let view = table.view().filter(spec)?;
    debug!(
        "Filter {:?} on {} table: {} of {} rows",
        spec,
        table.resolution(),
        view.len(),
        table.len()
    );
    Ok(view)
}

/// Apply `spec` to an existing view.
pub fn refine<'a>(view: &TableView<'a>, spec: &FilterSpec) -> Result<TableView<'a>> {
    view.filter(spec)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use fitdash_core::error::FitdashError;
    use fitdash_core::models::{MetricName, Reading, Resolution, Row, UserId};

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, 0, 0).unwrap()
    }

    fn hourly_table() -> CanonicalTable {
        let rows = [(1, 3), (2, 4), (1, 5), (2, 6), (1, 7)]
            .into_iter()
            .map(|(user, h)| Row {
                user_id: UserId(user),
                timestamp: at(h),
                values: vec![Some(Reading::Integer(h as i64))],
            })
            .collect();
        CanonicalTable::from_parts(Resolution::Hour, vec![MetricName::from("steps")], rows)
    }

    fn hours(view: &TableView<'_>) -> Vec<u32> {
        use chrono::Timelike;
        view.rows().iter().map(|r| r.timestamp.hour()).collect()
    }

    #[test]
    fn test_filter_by_user_keeps_source_order() {
        let table = hourly_table();
        let view = filter(&table, &FilterSpec::new(Resolution::Hour).user(UserId(1))).unwrap();
        assert_eq!(hours(&view), vec![3, 5, 7]);
        assert!(view.rows().iter().all(|r| r.user_id == UserId(1)));
    }

    #[test]
    fn test_no_constraints_returns_everything() {
        let table = hourly_table();
        let view = filter(&table, &FilterSpec::new(Resolution::Hour)).unwrap();
        assert_eq!(view.len(), table.len());
        assert_eq!(view.columns(), table.columns());
    }

    #[test]
    fn test_range_is_inclusive_on_both_ends() {
        let table = hourly_table();
        let spec = FilterSpec::new(Resolution::Hour).start(at(4)).end(at(6));
        let view = filter(&table, &spec).unwrap();
        assert_eq!(hours(&view), vec![4, 5, 6]);

        // A row one unit before the start falls outside.
        let step = Resolution::Hour.step();
        let spec = FilterSpec::new(Resolution::Hour).start(at(3) + step).end(at(4));
        let view = filter(&table, &spec).unwrap();
        assert_eq!(hours(&view), vec![4]);

        let spec = FilterSpec::new(Resolution::Hour).start(at(4)).end(at(4) + Duration::minutes(59));
        assert_eq!(hours(&filter(&table, &spec).unwrap()), vec![4]);
    }

    #[test]
    fn test_open_ended_ranges() {
        let table = hourly_table();
        let from = filter(&table, &FilterSpec::new(Resolution::Hour).start(at(6))).unwrap();
        assert_eq!(hours(&from), vec![6, 7]);
        let until = filter(&table, &FilterSpec::new(Resolution::Hour).end(at(4))).unwrap();
        assert_eq!(hours(&until), vec![3, 4]);
    }

    #[test]
    fn test_inverted_range_fails_immediately() {
        let table = hourly_table();
        let spec = FilterSpec::new(Resolution::Hour).start(at(6)).end(at(4));
        assert!(matches!(
            filter(&table, &spec),
            Err(FitdashError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_resolution_mismatch_is_config_error() {
        let table = hourly_table();
        assert!(matches!(
            filter(&table, &FilterSpec::new(Resolution::Day)),
            Err(FitdashError::Config(_))
        ));
    }

    #[test]
    fn test_filter_is_repeatable_and_refinable() {
        let table = hourly_table();
        let spec = FilterSpec::new(Resolution::Hour).user(UserId(2));
        let a = filter(&table, &spec).unwrap();
        let b = filter(&table, &spec).unwrap();
        assert_eq!(hours(&a), hours(&b));

        let narrowed = refine(&a, &FilterSpec::new(Resolution::Hour).start(at(5))).unwrap();
        assert_eq!(hours(&narrowed), vec![6]);
        // The table itself is untouched.
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_unknown_user_yields_empty_view() {
        let table = hourly_table();
        let view = filter(&table, &FilterSpec::new(Resolution::Hour).user(UserId(99))).unwrap();
        assert!(view.is_empty());
        assert!(view.time_bounds().is_none());
    }
}
