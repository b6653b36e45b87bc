use chrono::{DateTime, Utc};

use crate::models::{Reading, Resolution};

/// Marker printed for a cell with no reading.
pub const NO_READING: &str = "-";

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use fitdash_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by a relative epsilon so exact binary midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();
    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // "0.50" -> ".50"
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a reading in its native type: integers exactly, decimals with two
/// places.
///
/// ```
/// use fitdash_core::formatting::format_reading;
/// use fitdash_core::models::Reading;
///
/// assert_eq!(format_reading(Reading::Integer(12345)), "12,345");
/// assert_eq!(format_reading(Reading::Decimal(2.5)), "2.50");
/// ```
pub fn format_reading(reading: Reading) -> String {
    match reading {
        Reading::Integer(i) => {
            let grouped = group_thousands(&i.unsigned_abs().to_string());
            if i < 0 {
                format!("-{}", grouped)
            } else {
                grouped
            }
        }
        Reading::Decimal(d) => format_number(d, 2),
    }
}

/// Format an optional cell, using [`NO_READING`] for `None`.
pub fn format_cell(cell: Option<Reading>) -> String {
    cell.map(format_reading)
        .unwrap_or_else(|| NO_READING.to_string())
}

/// Render a row timestamp at the precision of its resolution.
pub fn format_timestamp(ts: DateTime<Utc>, resolution: Resolution) -> String {
    let fmt = match resolution {
        Resolution::Minute => "%Y-%m-%d %H:%M",
        Resolution::Hour => "%Y-%m-%d %H:00",
        Resolution::Day => "%Y-%m-%d",
    };
    ts.format(fmt).to_string()
}

/// Format a duration in minutes as `"45m"`, `"7h"` or `"7h 12m"`.
pub fn format_minutes(minutes: f64) -> String {
    let total = minutes.round() as i64;
    if total < 60 {
        return format!("{}m", total);
    }
    let (hours, mins) = (total / 60, total % 60);
    if mins == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h {}m", hours, mins)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = s.len() % 3;
    for (i, c) in s.chars().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(1_234.5, 1), "1,234.5");
        assert_eq!(format_number(1_000.0, 0), "1,000");
    }

    #[test]
    fn test_format_number_rounds_up() {
        assert_eq!(format_number(1.005, 2), "1.01");
    }

    #[test]
    fn test_format_reading_negative_integer() {
        assert_eq!(format_reading(Reading::Integer(-1234)), "-1,234");
        assert_eq!(format_reading(Reading::Integer(7)), "7");
    }

    #[test]
    fn test_format_cell_no_reading() {
        assert_eq!(format_cell(None), NO_READING);
        assert_eq!(format_cell(Some(Reading::Decimal(0.0))), "0.00");
    }

    #[test]
    fn test_format_timestamp_per_resolution() {
        let ts = Utc.with_ymd_and_hms(2016, 4, 12, 13, 5, 0).unwrap();
        assert_eq!(format_timestamp(ts, Resolution::Minute), "2016-04-12 13:05");
        assert_eq!(format_timestamp(ts, Resolution::Hour), "2016-04-12 13:00");
        assert_eq!(format_timestamp(ts, Resolution::Day), "2016-04-12");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(45.0), "45m");
        assert_eq!(format_minutes(420.0), "7h");
        assert_eq!(format_minutes(432.4), "7h 12m");
    }
}
