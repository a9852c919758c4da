//! Core types for stalesweep.
//!
//! This crate provides the data structures shared by the scanner, the
//! selection engine and the move executor: file records, ordered record
//! collections, and scan configuration.

mod collection;
mod config;
mod error;
mod record;
mod result;

pub use collection::FileCollection;
pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use record::{ContentHash, EntryKind, FileRecord, KindMask, Timestamps};
pub use result::{ScanResult, ScanStats};
