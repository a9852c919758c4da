//! Selection engine for stalesweep.
//!
//! This crate decides which files under a root should be cleaned up:
//!
//! - **Duplicate detection** - Find identical files using BLAKE3 hashing
//! - **Priority filter** - Pick large, stale files that fit in a byte budget
//! - **Selector** - Run scan, exclusion, deduplication and filtering end to end
//!
//! # Duplicate Detection
//!
//! Uses a two-phase algorithm:
//!
//! 1. Group files by size (instant)
//! 2. Compute full BLAKE3 hash for files that share a size
//!
//! ```rust,no_run
//! use stalesweep_scan::{BfsScanner, KindMask, ScanConfig};
//! use stalesweep_select::DuplicateFinder;
//!
//! let config = ScanConfig::new("/path/to/scan").with_kinds(KindMask::FILE);
//! let files = BfsScanner::new().scan(&config).unwrap().into_records();
//!
//! for group in DuplicateFinder::new().find_groups(&files) {
//!     println!("{} copies, {} bytes wasted", group.count(), group.wasted_bytes());
//! }
//! ```
//!
//! # Selection
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use stalesweep_select::{GlobExcluder, SelectConfig, Selector};
//!
//! let config = SelectConfig::builder()
//!     .root("/path/to/clean")
//!     .budget(10u64 * 1024 * 1024 * 1024)
//!     .min_staleness(Duration::from_secs(30 * 24 * 3600))
//!     .build()
//!     .unwrap();
//!
//! let selection = Selector::new(config)
//!     .select(&GlobExcluder::new(["*.keep", "/important"]))
//!     .unwrap();
//!
//! for file in &selection {
//!     println!("{:>3} {}", file.rank, file.record.path.display());
//! }
//! ```

mod duplicates;
mod exclude;
mod priority;
mod ranked;
mod select;

pub use duplicates::{
    DuplicateConfig, DuplicateConfigBuilder, DuplicateFinder, DuplicateGroup, DuplicatePolicy,
    hash_file,
};
pub use exclude::{ExcludeMatcher, GlobExcluder, NoExclusions};
pub use priority::PriorityFilter;
pub use ranked::{RankedFile, Selection, UnknownRank};
pub use select::{SelectConfig, SelectConfigBuilder, Selector};

// Re-export core types
pub use stalesweep_core::{ContentHash, FileCollection, FileRecord};
