//! Staleness-weighted greedy selection under a byte budget.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

use stalesweep_core::{FileCollection, FileRecord};

/// Picks the largest, least recently accessed files that fit in a budget.
///
/// Each candidate gets a priority of `accessed_seconds / size`; lower values
/// are picked first, so big files that nobody touched in a long time lead
/// the list.
#[derive(Debug, Clone, Copy)]
pub struct PriorityFilter {
    reference_time: SystemTime,
}

impl PriorityFilter {
    /// Create a filter that measures staleness against the current time.
    pub fn new() -> Self {
        Self {
            reference_time: SystemTime::now(),
        }
    }

    /// Create a filter that measures staleness against `reference_time`.
    pub fn with_reference_time(reference_time: SystemTime) -> Self {
        Self { reference_time }
    }

    /// Priority of a record. `None` for empty files, which are never picked.
    pub fn priority(record: &FileRecord) -> Option<u64> {
        if record.size == 0 {
            return None;
        }
        Some(record.timestamps.accessed_secs() / record.size)
    }

    /// Order `files` by priority ascending, ties by path.
    ///
    /// Empty files sort last.
    pub fn prioritize(&self, files: &FileCollection) -> Vec<FileRecord> {
        let mut ordered: Vec<FileRecord> = files.iter().cloned().collect();
        ordered.sort_by(|a, b| {
            let pa = Self::priority(a).unwrap_or(u64::MAX);
            let pb = Self::priority(b).unwrap_or(u64::MAX);
            pa.cmp(&pb)
                .then_with(|| a.path.as_os_str().cmp(b.path.as_os_str()))
        });
        ordered
    }

    /// Select the files to clean up.
    ///
    /// Skips empty files and files accessed after `reference - min_staleness`,
    /// then walks the rest in priority order and takes every file that still
    /// fits in what is left of `budget`. A file that does not fit is skipped
    /// and the walk continues.
    pub fn filter(
        &self,
        files: &FileCollection,
        budget: u64,
        min_staleness: Duration,
    ) -> FileCollection {
        let cutoff = self
            .reference_time
            .checked_sub(min_staleness)
            .unwrap_or(UNIX_EPOCH);

        let eligible: FileCollection = files
            .iter()
            .filter(|r| r.size > 0 && r.accessed() <= cutoff)
            .cloned()
            .collect();

        let mut remaining = budget;
        let mut selected = FileCollection::new();
        for record in self.prioritize(&eligible) {
            if record.size <= remaining {
                remaining -= record.size;
                selected.push(record);
            }
        }

        debug!(
            candidates = files.len(),
            eligible = eligible.len(),
            selected = selected.len(),
            unused_budget = remaining,
            "priority filter done"
        );
        selected
    }
}

impl Default for PriorityFilter {
    fn default() -> Self {
        Self::new()
    }
}
