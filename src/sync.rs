//! Composes the scanner, database reader/writer, detector, planner, crate
//! writer, and backup service into the three host-facing operations:
//! sync, report, and clean.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::backup::{self, BackupError};
use crate::cleanup::{self, CleanupStats};
use crate::config::Config;
use crate::crate_file;
use crate::detector;
use crate::planner;
use crate::scanner::{self, ScanError};
use crate::serato_db::{self, DbError, Record};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("configuration is missing serato_db_path or music_library_path")]
    ConfigMissing,
    #[error("database not found at {0:?}")]
    NotFound(std::path::PathBuf),
    #[error("failed to scan library: {0}")]
    Scan(#[from] ScanError),
    #[error("failed to read or write database: {0}")]
    Db(#[from] DbError),
    #[error("failed to back up database: {0}")]
    BackupFailed(#[from] BackupError),
}

/// Outcome of a sync run, implementing `Display` to produce the exact
/// user-facing summary line the host expects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub files_scanned: usize,
    pub pre_sync_record_count: usize,
    pub new_track_count: usize,
    pub tracks_added: usize,
    pub post_sync_record_count: usize,
    pub crates_written: usize,
    pub track_paths_written: usize,
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sync complete: {} file(s) scanned, {} new track(s), {} crate(s) written, \
             {} track path(s) written to crates, database now has {} record(s) (was {}).",
            self.files_scanned,
            self.new_track_count,
            self.crates_written,
            self.track_paths_written,
            self.post_sync_record_count,
            self.pre_sync_record_count,
        )
    }
}

/// Summary of a `clean_database` run, wrapping the cleanup pass's stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub stats: CleanupStats,
}

impl fmt::Display for CleanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Database cleanup complete.\n\
             - Original records: {}\n\
             - Removed (no path): {}\n\
             - Removed (corrupted): {}\n\
             - Removed (no metadata): {}\n\
             - Removed (duplicates): {}\n\
             - Final records: {}",
            self.stats.original,
            self.stats.removed_no_path,
            self.stats.removed_corrupted,
            self.stats.removed_no_metadata,
            self.stats.removed_duplicates,
            self.stats.final_count,
        )
    }
}

/// Holds logical exclusivity over a sync for its duration: no operation is
/// re-entrant, and the orchestrator does not attempt to detect whether
/// Serato itself has the database open.
pub struct Orchestrator {
    config: Config,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn validate_config(&self) -> Result<(), SyncError> {
        if !self.config.is_valid() {
            return Err(SyncError::ConfigMissing);
        }
        let db_path = self.config.database_path();
        if !db_path.exists() {
            return Err(SyncError::NotFound(db_path));
        }
        Ok(())
    }

    /// Scan the library, diff it against the database, write any affected
    /// crates, and append newly discovered tracks to the database.
    ///
    /// Scan errors, database-read errors, and backup errors are fatal — no
    /// crate or database writes occur. A per-crate write error is logged
    /// and the sync continues with the remaining crates. A database-write
    /// error after a successful backup is logged; the backup stays on disk
    /// as the recovery artifact.
    pub fn sync_library(&self) -> Result<SyncSummary, SyncError> {
        self.validate_config()?;

        let library_root = std::path::Path::new(&self.config.music_library_path);
        let library_map = scanner::scan_library(library_root)?;

        let db_path = self.config.database_path();
        let read = serato_db::read_database(&db_path, &self.config.music_library_path)?;

        let all_scanned: Vec<String> = library_map.values().flatten().cloned().collect();
        let files_scanned = all_scanned.len();

        let new_relative_paths = detector::find_new_tracks(&all_scanned, &read.stripped_paths);

        let affected_full_paths: HashSet<String> = new_relative_paths
            .iter()
            .map(|p| planner::build_ptrk(&read.library_prefix, p))
            .collect();

        let serato_root = std::path::Path::new(&self.config.serato_db_path);
        let plans = planner::build_crate_plans(&library_map, serato_root, &read.library_prefix);

        let mut crates_written = 0usize;
        let mut track_paths_written = 0usize;
        for plan in &plans {
            let touches_new_track = plan
                .track_paths
                .iter()
                .any(|p| affected_full_paths.contains(p));

            if !touches_new_track {
                continue;
            }

            match crate_file::write_crate(&plan.crate_path, &plan.track_paths) {
                Ok(()) => {
                    crates_written += 1;
                    track_paths_written += plan.track_paths.len();
                }
                Err(e) => {
                    error!("failed to write crate {:?}: {}", plan.crate_path, e);
                }
            }
        }

        let pre_sync_record_count = read.records.len();
        let mut post_sync_record_count = pre_sync_record_count;

        if !new_relative_paths.is_empty() {
            backup::backup_database(&db_path)?;

            let mut records = read.records;
            for relative_path in &new_relative_paths {
                let full_path = planner::build_ptrk(&read.library_prefix, relative_path);
                records.push(Record::with_path(&full_path));
            }
            post_sync_record_count = records.len();

            if let Err(e) = serato_db::write_database(&db_path, &records) {
                error!(
                    "failed to write database after successful backup: {}",
                    e
                );
                return Err(SyncError::Db(e));
            }
        }

        let summary = SyncSummary {
            files_scanned,
            pre_sync_record_count,
            new_track_count: new_relative_paths.len(),
            tracks_added: post_sync_record_count - pre_sync_record_count,
            post_sync_record_count,
            crates_written,
            track_paths_written,
        };

        info!("{}", summary);
        Ok(summary)
    }

    /// Read the database and report its total track count.
    pub fn generate_report(&self) -> Result<String, SyncError> {
        self.validate_config()?;

        let db_path = self.config.database_path();
        let read = serato_db::read_database(&db_path, &self.config.music_library_path)?;

        Ok(format!(
            "Database Report:\n- Total tracks: {}",
            read.records.len()
        ))
    }

    /// Back up the database, then run the cleanup pass and rewrite it.
    pub fn clean_database(
        &self,
        remove_duplicates: bool,
        require_metadata: bool,
    ) -> Result<CleanSummary, SyncError> {
        self.validate_config()?;

        let db_path = self.config.database_path();
        let read = serato_db::read_database(&db_path, &self.config.music_library_path)?;

        backup::backup_database(&db_path)?;

        let (kept, stats) = cleanup::clean_records(read.records, remove_duplicates, require_metadata);
        serato_db::write_database(&db_path, &kept)?;

        if stats.removed_duplicates + stats.removed_corrupted + stats.removed_no_path > 0 {
            warn!(
                "cleanup removed {} record(s): {} no-path, {} corrupted, {} no-metadata, {} duplicate",
                stats.original - stats.final_count,
                stats.removed_no_path,
                stats.removed_corrupted,
                stats.removed_no_metadata,
                stats.removed_duplicates,
            );
        }

        Ok(CleanSummary { stats })
    }
}
