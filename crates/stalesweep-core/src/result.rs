//! Scan result container and statistics.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::collection::FileCollection;
use crate::config::ScanConfig;
use crate::error::ScanWarning;
use crate::record::{EntryKind, FileRecord};

/// Summary statistics for everything a scan discovered, before kind filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Total bytes of regular files.
    pub total_size: u64,
    /// Number of regular files.
    pub total_files: u64,
    /// Number of directories (excluding the root).
    pub total_dirs: u64,
    /// Number of symbolic links.
    pub total_symlinks: u64,
    /// Number of sockets, devices and other special entries.
    pub total_other: u64,
    /// Number of breadth-first generations processed.
    pub generations: u32,
}

impl ScanStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with a discovered entry.
    pub fn record(&mut self, record: &FileRecord) {
        match record.kind {
            EntryKind::File => {
                self.total_files += 1;
                self.total_size += record.size;
            }
            EntryKind::Directory => self.total_dirs += 1,
            EntryKind::Symlink => self.total_symlinks += 1,
            EntryKind::Other => self.total_other += 1,
        }
    }

    /// Total number of entries discovered.
    pub fn total_entries(&self) -> u64 {
        self.total_files + self.total_dirs + self.total_symlinks + self.total_other
    }
}

/// Records produced by one scan of a tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Canonical root path that was scanned.
    pub root: PathBuf,

    /// Records that passed the configured kind mask.
    pub records: FileCollection,

    /// When this scan was performed.
    pub scanned_at: SystemTime,

    /// Duration of the scan.
    pub scan_duration: Duration,

    /// Scan configuration used.
    pub config: ScanConfig,

    /// Summary statistics.
    pub stats: ScanStats,

    /// Entries skipped during the scan.
    pub warnings: Vec<ScanWarning>,
}

impl ScanResult {
    /// Create a new scan result.
    pub fn new(
        root: PathBuf,
        records: FileCollection,
        config: ScanConfig,
        stats: ScanStats,
        scan_duration: Duration,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        Self {
            root,
            records,
            scanned_at: SystemTime::now(),
            scan_duration,
            config,
            stats,
            warnings,
        }
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Take the records, dropping the metadata.
    pub fn into_records(self) -> FileCollection {
        self.records
    }
}
