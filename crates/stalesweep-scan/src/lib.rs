//! Directory scanning engine for stalesweep.
//!
//! The scanner walks a tree breadth-first, one generation (tree level) at a
//! time. A bounded pool of worker threads lists the directories of a
//! generation in parallel and stats every entry exactly once; the next
//! generation starts only after the current one has been fully collected.
//!
//! # Example
//!
//! ```rust,no_run
//! use stalesweep_scan::{BfsScanner, KindMask, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/scan").with_kinds(KindMask::FILE);
//! let result = BfsScanner::new().scan(&config).unwrap();
//!
//! println!("{} files, {} bytes", result.stats.total_files, result.stats.total_size);
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use stalesweep_scan::{BfsScanner, ScanConfig};
//!
//! let scanner = BfsScanner::new();
//! let mut progress_rx = scanner.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(progress) = progress_rx.blocking_recv() {
//!         println!("generation {}: {} files", progress.generation, progress.files_scanned);
//!     }
//! });
//! ```

mod progress;
mod scanner;

pub use progress::ScanProgress;
pub use scanner::BfsScanner;

// Re-export core types for convenience
pub use stalesweep_core::{
    EntryKind, FileCollection, FileRecord, KindMask, ScanConfig, ScanError, ScanResult,
    ScanStats, ScanWarning, Timestamps, WarningKind,
};
