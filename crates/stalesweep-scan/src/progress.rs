//! Scan progress reporting.

use std::time::Duration;

/// Progress snapshot, broadcast once per completed generation.
#[derive(Debug, Clone, Default)]
pub struct ScanProgress {
    /// Number of files found so far.
    pub files_scanned: u64,
    /// Number of directories found so far.
    pub dirs_scanned: u64,
    /// Total bytes of files found so far.
    pub bytes_scanned: u64,
    /// Generation that just finished (1 = the root's children).
    pub generation: u32,
    /// Directories queued for the next generation.
    pub pending_dirs: usize,
    /// Number of entries skipped so far.
    pub errors_count: u64,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_scanned as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total items scanned (files + dirs).
    pub fn total_items(&self) -> u64 {
        self.files_scanned + self.dirs_scanned
    }

    /// Whether this was the last generation of the scan.
    pub fn is_final(&self) -> bool {
        self.pending_dirs == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let progress = ScanProgress {
            files_scanned: 100,
            dirs_scanned: 5,
            elapsed: Duration::from_secs(2),
            ..ScanProgress::new()
        };
        assert_eq!(progress.files_per_second(), 50.0);
        assert_eq!(progress.total_items(), 105);
        assert!(progress.is_final());
        assert_eq!(ScanProgress::new().files_per_second(), 0.0);
    }
}
