//! Rebuild-and-swap holder for the current dataset.
//!
//! [`DatasetManager::reload`] reads the export folders and builds a complete
//! new [`Dataset`] before taking the write lock, so readers holding a
//! [`DatasetManager::snapshot`] never see a half-built table. A failed
//! reload leaves the previous snapshot in place.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use fitdash_core::error::Result;
use fitdash_core::schema::SchemaMap;
use fitdash_data::loader::{load_folders, SkipReason};
use fitdash_data::Dataset;

// ── Status ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct BuildStatus {
    /// Number of successful swaps so far.
    generation: u64,
    last_build: Option<Instant>,
    last_error: Option<String>,
    skipped_files: Vec<PathBuf>,
}

// ── DatasetManager ────────────────────────────────────────────────────────────

/// Holds the current dataset and rebuilds it on demand.
///
/// # Example
/// ```no_run
/// use fitdash_core::schema::SchemaMap;
/// use fitdash_runtime::manager::DatasetManager;
///
/// let mgr = DatasetManager::new(SchemaMap::fitbit(), vec!["data/Folder_1".into()]);
/// mgr.reload().ok();
/// println!("users: {}", mgr.snapshot().user_ids().len());
/// ```
pub struct DatasetManager {
    schema: SchemaMap,
    folders: Vec<PathBuf>,
    current: RwLock<Arc<Dataset>>,
    status: Mutex<BuildStatus>,
}

impl DatasetManager {
    /// Create a manager holding an empty dataset until the first reload.
    pub fn new(schema: SchemaMap, folders: Vec<PathBuf>) -> Self {
        Self {
            schema,
            folders,
            current: RwLock::new(Arc::new(Dataset::empty())),
            status: Mutex::new(BuildStatus::default()),
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Load the folders, build a new dataset and swap it in.
    ///
    /// On failure the previous dataset stays current and the error is kept
    /// for [`DatasetManager::last_error`].
    pub fn reload(&self) -> Result<Arc<Dataset>> {
        match self.build() {
            Ok((dataset, skipped)) => {
                let dataset = Arc::new(dataset);
                *self.current.write().unwrap_or_else(PoisonError::into_inner) =
                    Arc::clone(&dataset);

                let mut status = self.lock_status();
                status.generation += 1;
                status.last_build = Some(Instant::now());
                status.last_error = None;
                status.skipped_files = skipped;
                tracing::debug!(generation = status.generation, "dataset swapped");
                Ok(dataset)
            }
            Err(e) => {
                tracing::warn!(error = %e, "reload failed; keeping previous dataset");
                self.lock_status().last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// The dataset currently in effect.
    pub fn snapshot(&self) -> Arc<Dataset> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Human-readable description of the last reload error, or `None`.
    pub fn last_error(&self) -> Option<String> {
        self.lock_status().last_error.clone()
    }

    /// Time since the last successful swap, or `None` before the first one.
    pub fn last_build_age(&self) -> Option<Duration> {
        self.lock_status().last_build.map(|t| t.elapsed())
    }

    /// Number of successful reloads; `0` means the empty initial dataset.
    pub fn generation(&self) -> u64 {
        self.lock_status().generation
    }

    /// CSV files the last successful reload passed over.
    pub fn skipped_files(&self) -> Vec<PathBuf> {
        self.lock_status().skipped_files.clone()
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn build(&self) -> Result<(Dataset, Vec<PathBuf>)> {
        let outcome = load_folders(&self.folders, &self.schema)?;
        for skipped in &outcome.skipped {
            if let SkipReason::Failed(e) = &skipped.reason {
                tracing::warn!(path = %skipped.path.display(), error = %e, "file not loaded");
            }
        }
        let skipped = outcome.skipped.into_iter().map(|s| s.path).collect();
        let dataset = Dataset::build(&self.schema, &outcome.sources)?;
        Ok((dataset, skipped))
    }

    fn lock_status(&self) -> std::sync::MutexGuard<'_, BuildStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
