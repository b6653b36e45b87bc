use chrono::{
    DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{FitdashError, Result};
use crate::models::Resolution;

/// Earliest calendar year accepted from a source.
pub const MIN_YEAR: i32 = 1970;
/// Latest calendar year accepted from a source.
pub const MAX_YEAR: i32 = 2100;

/// Formats tried, in order, after RFC 3339.
///
/// The first two cover the Fitbit export (`4/12/2016 1:00:00 AM`); the
/// date-only forms resolve to midnight.
pub const DEFAULT_TIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d",
];

// ── Truncation ────────────────────────────────────────────────────────────────

/// Drop everything finer than `resolution` from a wall-clock time.
pub fn truncate_naive(naive: NaiveDateTime, resolution: Resolution) -> NaiveDateTime {
    let date = naive.date();
    let truncated = match resolution {
        Resolution::Minute => date.and_hms_opt(naive.hour(), naive.minute(), 0),
        Resolution::Hour => date.and_hms_opt(naive.hour(), 0, 0),
        Resolution::Day => date.and_hms_opt(0, 0, 0),
    };
    // and_hms_opt only fails for out-of-range components, which these are not.
    truncated.unwrap_or(naive)
}

/// Truncate a UTC instant on the UTC calendar.
pub fn truncate_utc(dt: DateTime<Utc>, resolution: Resolution) -> DateTime<Utc> {
    Utc.from_utc_datetime(&truncate_naive(dt.naive_utc(), resolution))
}

// ── TimestampParser ───────────────────────────────────────────────────────────

/// The single place where source timestamps are interpreted.
///
/// Naive wall-clock values are read in the configured source timezone,
/// truncated to the record's resolution in that timezone and then converted
/// to UTC, so every source shares one convention.
#[derive(Debug, Clone)]
pub struct TimestampParser {
    tz: Tz,
    formats: Vec<String>,
}

impl TimestampParser {
    /// Create a parser for the IANA timezone `tz_name`.
    ///
    /// An unrecognised timezone is a configuration error; silently falling
    /// back would shift every timestamp in the dataset.
    pub fn new(tz_name: &str, formats: Vec<String>) -> Result<Self> {
        let tz = tz_name
            .parse::<Tz>()
            .map_err(|_| FitdashError::Config(format!("unknown timezone: {tz_name}")))?;
        let formats = if formats.is_empty() {
            DEFAULT_TIME_FORMATS.iter().map(|f| f.to_string()).collect()
        } else {
            formats
        };
        Ok(Self { tz, formats })
    }

    /// UTC parser with the default formats.
    pub fn utc() -> Self {
        Self {
            tz: Tz::UTC,
            formats: DEFAULT_TIME_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Parse `s` and truncate it to `resolution`.
    ///
    /// Returns `None` for blank or unrecognised input, years outside
    /// [`MIN_YEAR`]..=[`MAX_YEAR`] and local times that do not exist in the
    /// source timezone. Ambiguous naive times resolve to the earlier instant;
    /// input with an explicit offset keeps that offset through truncation.
    pub fn parse(&self, s: &str, resolution: Resolution) -> Option<DateTime<Utc>> {
        match self.parse_local(s)? {
            Parsed::Naive(naive) => self.resolve(truncate_naive(naive, resolution)),
            Parsed::Instant(dt) => self.truncate_instant(dt, resolution),
        }
    }

    /// Parse `s` without truncation, e.g. for query bounds.
    pub fn parse_instant(&self, s: &str) -> Option<DateTime<Utc>> {
        match self.parse_local(s)? {
            Parsed::Naive(naive) => self.resolve(naive),
            Parsed::Instant(dt) => Some(dt.with_timezone(&Utc)),
        }
    }

    /// Interpret Unix seconds, truncating on the source timezone's calendar.
    pub fn from_unix(&self, secs: i64, resolution: Resolution) -> Option<DateTime<Utc>> {
        let dt = DateTime::from_timestamp(secs, 0)?.with_timezone(&self.tz);
        if !(MIN_YEAR..=MAX_YEAR).contains(&dt.year()) {
            return None;
        }
        self.truncate_instant(dt, resolution)
    }

    fn parse_local(&self, s: &str) -> Option<Parsed> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let normalised = match s.strip_suffix('Z') {
            Some(stripped) => format!("{stripped}+00:00"),
            None => s.to_string(),
        };

        let parsed = if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            Some(Parsed::Instant(dt.with_timezone(&self.tz)))
        } else {
            self.formats
                .iter()
                .find_map(|fmt| {
                    NaiveDateTime::parse_from_str(s, fmt).ok().or_else(|| {
                        NaiveDate::parse_from_str(s, fmt)
                            .ok()
                            .and_then(|d| d.and_hms_opt(0, 0, 0))
                    })
                })
                .map(Parsed::Naive)
        };

        let Some(parsed) = parsed else {
            debug!("TimestampParser: could not parse timestamp \"{}\"", s);
            return None;
        };

        if !(MIN_YEAR..=MAX_YEAR).contains(&parsed.local_year()) {
            debug!("TimestampParser: year out of range in \"{}\"", s);
            return None;
        }
        Some(parsed)
    }

    /// Naive wall-clock time in the source timezone; earlier instant wins.
    fn resolve(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earlier, _) => Some(earlier.with_timezone(&Utc)),
            LocalResult::None => None,
        }
    }

    /// Truncate a known instant on the local calendar.
    ///
    /// In a repeated hour the candidate sharing the instant's own offset is
    /// kept, otherwise the latest candidate not after the instant.
    fn truncate_instant(
        &self,
        dt: DateTime<Tz>,
        resolution: Resolution,
    ) -> Option<DateTime<Utc>> {
        let local = truncate_naive(dt.naive_local(), resolution);
        let offset = dt.offset().fix();
        let picked = match self.tz.from_local_datetime(&local) {
            LocalResult::Single(t) => t,
            LocalResult::Ambiguous(earlier, later) => {
                if earlier.offset().fix() == offset {
                    earlier
                } else if later.offset().fix() == offset || later <= dt {
                    later
                } else {
                    earlier
                }
            }
            LocalResult::None => return None,
        };
        Some(picked.with_timezone(&Utc))
    }
}

/// Parsed input before truncation.
enum Parsed {
    /// Wall-clock time without an offset.
    Naive(NaiveDateTime),
    /// Input that carried its own offset, viewed in the source timezone.
    Instant(DateTime<Tz>),
}

impl Parsed {
    fn local_year(&self) -> i32 {
        match self {
            Parsed::Naive(naive) => naive.year(),
            Parsed::Instant(dt) => dt.year(),
        }
    }
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self::utc()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
