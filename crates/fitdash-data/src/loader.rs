//! CSV discovery and loading.
//!
//! Walks export folders, tags each `.csv` file with the `(resolution,
//! family)` whose `file_pattern` matches its stem and reads it into a
//! [`RawSource`]. This is the only part of the pipeline that touches disk.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use fitdash_core::error::{FitdashError, Result};
use fitdash_core::models::{MetricFamily, RawRecord, RawSource, RawValue, Resolution};
use fitdash_core::schema::SchemaMap;
use regex::Regex;
use tracing::{debug, warn};

// ── Types ─────────────────────────────────────────────────────────────────────

/// Why a file did not become a source.
#[derive(Debug)]
pub enum SkipReason {
    /// No `file_pattern` matched the file stem.
    Unmatched,
    /// The file matched but could not be read or parsed.
    Failed(FitdashError),
}

#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Sources read from disk plus the files that were passed over.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub sources: Vec<RawSource>,
    pub skipped: Vec<SkippedFile>,
}

// ── FileClassifier ────────────────────────────────────────────────────────────

/// Compiled `file_pattern` regexes in schema declaration order.
pub struct FileClassifier {
    patterns: Vec<(Regex, Resolution, MetricFamily)>,
}

impl FileClassifier {
    pub fn new(schema: &SchemaMap) -> Result<Self> {
        let patterns = schema
            .sources
            .iter()
            .filter_map(|m| m.file_pattern.as_ref().map(|p| (p, m.resolution, m.family)))
            .map(|(pattern, res, fam)| {
                Regex::new(pattern)
                    .map(|re| (re, res, fam))
                    .map_err(|e| {
                        FitdashError::Config(format!("invalid file pattern {pattern:?}: {e}"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// First mapping whose pattern matches the file stem.
    pub fn classify(&self, path: &Path) -> Option<(Resolution, MetricFamily)> {
        let stem = path.file_stem()?.to_str()?;
        self.patterns
            .iter()
            .find(|(re, _, _)| re.is_match(stem))
            .map(|(_, res, fam)| (*res, *fam))
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `folder`, sorted by path.
pub fn find_csv_files(folder: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Read one CSV file into a source tagged with `resolution` and `family`.
///
/// Every cell arrives as text; blank cells become [`RawValue::Empty`]. Rows
/// shorter than the header leave their trailing columns empty. A cell that
/// is not valid UTF-8 is kept in its lossy form for the normalizer to
/// reject; only an unreadable header fails the whole file.
pub fn read_csv_source(
    path: &Path,
    resolution: Resolution,
    family: MetricFamily,
) -> Result<RawSource> {
    let file = std::fs::File::open(path).map_err(|source| FitdashError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source| FitdashError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mut source = RawSource::new(name, resolution, family, columns.clone());

    // Cells are decoded one by one so a stray byte costs one cell, not the file.
    let mut lossy_rows = 0usize;
    for result in reader.byte_records() {
        let record = result.map_err(csv_err)?;
        let mut lossy = false;
        let raw: RawRecord = columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let cell = match record.get(i).map(String::from_utf8_lossy) {
                    Some(Cow::Borrowed(text)) => RawValue::from_cell(text),
                    Some(Cow::Owned(text)) => {
                        lossy = true;
                        RawValue::Text(text)
                    }
                    None => RawValue::Empty,
                };
                (col.as_str(), cell)
            })
            .collect();
        if lossy {
            lossy_rows += 1;
        }
        source.push(raw);
    }
    if lossy_rows > 0 {
        warn!(
            "{} rows in {} contain invalid UTF-8",
            lossy_rows,
            path.display()
        );
    }

    debug!(
        "Read {} rows from {} as {}/{}",
        source.records.len(),
        path.display(),
        resolution,
        family
    );
    Ok(source)
}

/// Load every recognised CSV file under `folders`.
///
/// Folders are processed in the given order and files within a folder in
/// lexical order; this order decides which value survives a collision. A
/// missing folder is an error. Unrecognised and unreadable files are
/// listed in [`LoadOutcome::skipped`] and do not stop the load.
pub fn load_folders(folders: &[PathBuf], schema: &SchemaMap) -> Result<LoadOutcome> {
    let classifier = FileClassifier::new(schema)?;
    let mut outcome = LoadOutcome::default();

    for folder in folders {
        if !folder.is_dir() {
            return Err(FitdashError::DataPathNotFound(folder.clone()));
        }

        let files = find_csv_files(folder);
        if files.is_empty() {
            warn!("No CSV files found in {}", folder.display());
        }

        for path in files {
            let Some((resolution, family)) = classifier.classify(&path) else {
                debug!("No mapping matches {}, skipping", path.display());
                outcome.skipped.push(SkippedFile {
                    path,
                    reason: SkipReason::Unmatched,
                });
                continue;
            };

            match read_csv_source(&path, resolution, family) {
                Ok(source) => outcome.sources.push(source),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    outcome.skipped.push(SkippedFile {
                        path,
                        reason: SkipReason::Failed(e),
                    });
                }
            }
        }
    }

    debug!(
        "Loaded {} sources from {} folders ({} skipped)",
        outcome.sources.len(),
        folders.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    // ── find_csv_files ────────────────────────────────────────────────────────

    #[test]
    fn test_find_csv_files_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("nested");
        std::fs::create_dir_all(&sub).unwrap();
        write_csv(dir.path(), "b.csv", "Id\n");
        write_csv(dir.path(), "a.CSV", "Id\n");
        write_csv(&sub, "c.csv", "Id\n");
        write_csv(dir.path(), "notes.txt", "hello");

        let files = find_csv_files(dir.path());
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["a.CSV", "b.csv", "nested/c.csv"]);
    }

    // ── FileClassifier ────────────────────────────────────────────────────────

    #[test]
    fn test_classifier_matches_fitbit_names() {
        let classifier = FileClassifier::new(&SchemaMap::fitbit()).unwrap();
        assert_eq!(
            classifier.classify(Path::new("/x/hourlySteps_merged.csv")),
            Some((Resolution::Hour, MetricFamily::Steps))
        );
        assert_eq!(
            classifier.classify(Path::new("minuteSleep_merged.csv")),
            Some((Resolution::Minute, MetricFamily::Sleep))
        );
        assert_eq!(
            classifier.classify(Path::new("weightLogInfo_merged.csv")),
            Some((Resolution::Day, MetricFamily::Weight))
        );
        assert_eq!(classifier.classify(Path::new("heartrate_seconds_merged.csv")), None);
    }

    // ── read_csv_source ───────────────────────────────────────────────────────

    #[test]
    fn test_read_csv_source_cells() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "weightLogInfo_merged.csv",
            "Id,Date,WeightKg,WeightPounds,Fat,BMI,IsManualReport,LogId\n\
             1503960366,5/2/2016 11:59:59 PM,52.599998,115.963147,22,22.65,True,1462233599000\n\
             1927972279,4/13/2016 1:08:52 AM,133.5,294.31712,,47.54\n",
        );

        let src = read_csv_source(&path, Resolution::Day, MetricFamily::Weight).unwrap();
        assert_eq!(src.name, "weightLogInfo_merged.csv");
        assert_eq!(src.columns.len(), 8);
        assert_eq!(src.records.len(), 2);
        assert_eq!(
            src.records[0].get("WeightKg"),
            Some(&RawValue::Text("52.599998".to_string()))
        );
        assert_eq!(src.records[1].get("Fat"), Some(&RawValue::Empty));
        // Short row: trailing columns are empty.
        assert_eq!(src.records[1].get("LogId"), Some(&RawValue::Empty));
    }

    #[test]
    fn test_read_csv_source_missing_file() {
        let err = read_csv_source(
            Path::new("/tmp/does-not-exist-fitdash-xyz.csv"),
            Resolution::Day,
            MetricFamily::Sleep,
        )
        .unwrap_err();
        assert!(matches!(err, FitdashError::FileRead { .. }));
    }

    #[test]
    fn test_read_csv_source_bad_utf8_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sleepDay_merged.csv");
        std::fs::write(&path, b"Id,Sleep\xffDay\n1,4/12/2016\n").unwrap();
        let err = read_csv_source(&path, Resolution::Day, MetricFamily::Sleep).unwrap_err();
        assert!(matches!(err, FitdashError::Csv { .. }));
    }

    #[test]
    fn test_bad_utf8_cell_costs_only_its_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hourlyCalories_merged.csv");
        std::fs::write(
            &path,
            b"Id,ActivityHour,Calories\n\
              1,3/1/2024 5:00:00 AM,81\n\
              1,3/1/2024 6:00:00 AM,\xff\n\
              1,3/1/2024 7:00:00 AM,95\n",
        )
        .unwrap();

        let src = read_csv_source(&path, Resolution::Hour, MetricFamily::Calories).unwrap();
        assert_eq!(src.records.len(), 3);
        assert_eq!(
            src.records[1].get("Calories"),
            Some(&RawValue::Text("\u{FFFD}".to_string()))
        );

        let out = normalize(&SchemaMap::fitbit(), &[src]).unwrap();
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.report.error_count(), 1);
        assert!(matches!(
            out.report.failures().next(),
            Some((_, FitdashError::InvalidValue { row: 1, .. }))
        ));
    }

    // ── load_folders ──────────────────────────────────────────────────────────

    #[test]
    fn test_load_folders_in_declared_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_csv(
            second.path(),
            "hourlySteps_merged.csv",
            "Id,ActivityHour,StepTotal\n1,3/1/2024 5:00:00 AM,10\n",
        );
        write_csv(
            first.path(),
            "hourlyCalories_merged.csv",
            "Id,ActivityHour,Calories\n1,3/1/2024 5:00:00 AM,81\n",
        );
        write_csv(first.path(), "heartrate_seconds_merged.csv", "Id,Time,Value\n");

        let folders = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let outcome = load_folders(&folders, &SchemaMap::fitbit()).unwrap();

        let names: Vec<&str> = outcome.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["hourlyCalories_merged.csv", "hourlySteps_merged.csv"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(matches!(outcome.skipped[0].reason, SkipReason::Unmatched));
    }

    #[test]
    fn test_load_folders_missing_folder() {
        let err = load_folders(
            &[PathBuf::from("/tmp/does-not-exist-fitdash-dir")],
            &SchemaMap::fitbit(),
        )
        .unwrap_err();
        assert!(matches!(err, FitdashError::DataPathNotFound(_)));
    }

    #[test]
    fn test_load_folders_keeps_going_after_bad_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("dailyActivity_merged.csv"), b"I\xffd\n1\n").unwrap();
        write_csv(
            dir.path(),
            "sleepDay_merged.csv",
            "Id,SleepDay,TotalSleepRecords,TotalMinutesAsleep,TotalTimeInBed\n\
             1,4/12/2016 12:00:00 AM,1,327,346\n",
        );

        let outcome = load_folders(&[dir.path().to_path_buf()], &SchemaMap::fitbit()).unwrap();
        assert_eq!(outcome.sources.len(), 1);
        assert!(matches!(
            outcome.skipped[0].reason,
            SkipReason::Failed(FitdashError::Csv { .. })
        ));
    }
}
