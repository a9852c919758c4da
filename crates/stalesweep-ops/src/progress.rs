//! Progress and outcome types for move operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Progress information for an ongoing move.
#[derive(Debug, Clone)]
pub struct MoveProgress {
    /// Number of files moved so far.
    pub files_completed: usize,
    /// Total number of files to move.
    pub files_total: usize,
    /// Number of bytes moved so far.
    pub bytes_processed: u64,
    /// Total bytes to move.
    pub bytes_total: u64,
    /// The file currently being moved.
    pub current_file: Option<PathBuf>,
}

impl MoveProgress {
    /// Create a new progress tracker.
    pub fn new(files_total: usize, bytes_total: u64) -> Self {
        Self {
            files_completed: 0,
            files_total,
            bytes_processed: 0,
            bytes_total,
            current_file: None,
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.bytes_total > 0 {
            (self.bytes_processed as f64 / self.bytes_total as f64) * 100.0
        } else if self.files_total > 0 {
            (self.files_completed as f64 / self.files_total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Update the current file being processed.
    pub fn set_current_file(&mut self, path: Option<PathBuf>) {
        self.current_file = path;
    }

    /// Increment the completed count and add bytes.
    pub fn complete_file(&mut self, bytes: u64) {
        self.files_completed += 1;
        self.bytes_processed += bytes;
    }
}

/// Result of a completed move.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveReport {
    /// `(source, destination)` of every moved file, in move order.
    pub moved: Vec<(PathBuf, PathBuf)>,
    /// Total bytes copied.
    pub bytes_moved: u64,
}

impl MoveReport {
    /// Number of files moved.
    pub fn count(&self) -> usize {
        self.moved.len()
    }

    /// Get a human-readable summary of the operation.
    pub fn summary(&self) -> String {
        match self.count() {
            1 => "1 file moved".to_string(),
            n => format!("{n} files moved"),
        }
    }
}
