//! Ranked selection results.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stalesweep_core::{FileCollection, FileRecord, ScanWarning};

/// A selected file with its position in the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedFile {
    /// 1-based position in the full selection. Kept when the selection is
    /// narrowed with [`Selection::pick`].
    pub rank: usize,

    /// Whether the file was selected as a redundant copy.
    pub duplicate: bool,

    #[serde(flatten)]
    pub record: FileRecord,
}

/// A rank that does not exist in the selection.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no file with number {rank} (selection has {len})")]
pub struct UnknownRank {
    pub rank: usize,
    pub len: usize,
}

/// Ordered outcome of a selection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    /// Canonical scan root.
    pub root: PathBuf,

    /// Selected files in rank order.
    pub files: Vec<RankedFile>,

    /// Entries the scanner had to skip.
    pub warnings: Vec<ScanWarning>,
}

impl Selection {
    /// Rank `duplicates` then `others`, in that order, starting at 1.
    pub fn ranked(
        root: PathBuf,
        duplicates: FileCollection,
        others: FileCollection,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        let tagged = duplicates
            .into_iter()
            .map(|r| (true, r))
            .chain(others.into_iter().map(|r| (false, r)));
        let files = tagged
            .enumerate()
            .map(|(i, (duplicate, record))| RankedFile {
                rank: i + 1,
                duplicate,
                record,
            })
            .collect();

        Self {
            root,
            files,
            warnings,
        }
    }

    /// Number of selected files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over the selected files in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, RankedFile> {
        self.files.iter()
    }

    /// Sum of the sizes of all selected files.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.record.size).sum()
    }

    /// Number of files selected as duplicates.
    pub fn duplicate_count(&self) -> usize {
        self.files.iter().filter(|f| f.duplicate).count()
    }

    /// Look up a file by its rank.
    pub fn get_rank(&self, rank: usize) -> Option<&RankedFile> {
        self.files.iter().find(|f| f.rank == rank)
    }

    /// Narrow the selection to `ranks`, in the order given.
    ///
    /// Files keep their original rank. Repeated ranks are taken once.
    pub fn pick(&self, ranks: &[usize]) -> Result<Selection, UnknownRank> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for &rank in ranks {
            let file = self.get_rank(rank).ok_or(UnknownRank {
                rank,
                len: self.len(),
            })?;
            if seen.insert(rank) {
                files.push(file.clone());
            }
        }

        Ok(Selection {
            root: self.root.clone(),
            files,
            warnings: self.warnings.clone(),
        })
    }

    /// The selected records without annotations, in rank order.
    pub fn to_collection(&self) -> FileCollection {
        self.files.iter().map(|f| f.record.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = &'a RankedFile;
    type IntoIter = std::slice::Iter<'a, RankedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stalesweep_core::Timestamps;
    use std::time::SystemTime;

    fn record(path: &str, size: u64) -> FileRecord {
        let now = SystemTime::now();
        FileRecord::file(path, size, Timestamps::new(now, now))
    }

    fn sample() -> Selection {
        let dups: FileCollection = vec![record("/r/dup", 30)].into_iter().collect();
        let rest: FileCollection = vec![record("/r/a", 10), record("/r/b", 20)]
            .into_iter()
            .collect();
        Selection::ranked(PathBuf::from("/r"), dups, rest, Vec::new())
    }

    #[test]
    fn test_ranks_follow_concatenation() {
        let selection = sample();
        let ranks: Vec<_> = selection.iter().map(|f| (f.rank, f.duplicate)).collect();
        assert_eq!(ranks, vec![(1, true), (2, false), (3, false)]);
        assert_eq!(selection.total_size(), 60);
        assert_eq!(selection.duplicate_count(), 1);
    }

    #[test]
    fn test_pick_keeps_original_ranks() {
        let selection = sample();
        let picked = selection.pick(&[3, 1, 3]).unwrap();
        let ranks: Vec<_> = picked.iter().map(|f| f.rank).collect();
        assert_eq!(ranks, vec![3, 1]);
        assert_eq!(picked.get_rank(3).unwrap().record.path, PathBuf::from("/r/b"));
        assert!(picked.get_rank(2).is_none());
    }

    #[test]
    fn test_pick_unknown_rank() {
        let err = sample().pick(&[4]).unwrap_err();
        assert_eq!(err, UnknownRank { rank: 4, len: 3 });
        assert!(sample().pick(&[0]).is_err());
    }

    #[test]
    fn test_serialized_file_is_flat() {
        let selection = sample();
        let value = serde_json::to_value(&selection.files[0]).unwrap();
        assert_eq!(value["rank"], 1);
        assert_eq!(value["duplicate"], true);
        assert_eq!(value["size"], 30);
        assert!(value.get("record").is_none());
    }
}
