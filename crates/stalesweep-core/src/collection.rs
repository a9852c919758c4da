//! Ordered collections of file records with set-like operations.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::record::FileRecord;

/// An ordered sequence of [`FileRecord`]s.
///
/// Order reflects whatever produced the collection (scan order, sort order)
/// and only carries meaning after an explicit sort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileCollection {
    records: Vec<FileRecord>,
}

impl FileCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection from records.
    pub fn from_records(records: Vec<FileRecord>) -> Self {
        Self { records }
    }

    /// Append a record.
    pub fn push(&mut self, record: FileRecord) {
        self.records.push(record);
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, FileRecord> {
        self.records.iter()
    }

    /// Borrow the records as a slice.
    pub fn as_slice(&self) -> &[FileRecord] {
        &self.records
    }

    /// Take the underlying records.
    pub fn into_vec(self) -> Vec<FileRecord> {
        self.records
    }

    /// Check whether a record with `path` is present.
    pub fn contains(&self, path: &Path) -> bool {
        self.records.iter().any(|r| r.path == path)
    }

    /// Find the record with `path`.
    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.path == path)
    }

    /// All records whose path does not appear in `other`, in this
    /// collection's order.
    pub fn difference(&self, other: &FileCollection) -> FileCollection {
        let exclude: HashSet<&Path> = other.iter().map(|r| r.path.as_path()).collect();
        self.records
            .iter()
            .filter(|r| !exclude.contains(r.path.as_path()))
            .cloned()
            .collect()
    }

    /// Sum of all record sizes.
    pub fn total_size(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }

    /// Keep only the records matching the predicate.
    pub fn retain(&mut self, f: impl FnMut(&FileRecord) -> bool) {
        self.records.retain(f);
    }

    /// Sort by path, comparing the raw bytes of the path.
    pub fn sort_by_path(&mut self) {
        self.records
            .sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));
    }

    /// Sort by size descending, breaking ties by path.
    pub fn sort_by_size_desc(&mut self) {
        self.records.sort_by(|a, b| {
            b.size
                .cmp(&a.size)
                .then_with(|| a.path.as_os_str().cmp(b.path.as_os_str()))
        });
    }
}

impl FromIterator<FileRecord> for FileCollection {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl Extend<FileRecord> for FileCollection {
    fn extend<I: IntoIterator<Item = FileRecord>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}

impl IntoIterator for FileCollection {
    type Item = FileRecord;
    type IntoIter = std::vec::IntoIter<FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a FileCollection {
    type Item = &'a FileRecord;
    type IntoIter = std::slice::Iter<'a, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Timestamps;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn record(path: &str, size: u64) -> FileRecord {
        let now = SystemTime::now();
        FileRecord::file(path, size, Timestamps::new(now, now))
    }

    #[test]
    fn test_difference_keeps_order() {
        let all: FileCollection = vec![record("/c", 1), record("/a", 2), record("/b", 3)]
            .into_iter()
            .collect();
        let remove: FileCollection = vec![record("/a", 2)].into_iter().collect();

        let rest = all.difference(&remove);
        let paths: Vec<_> = rest.iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("/c"), PathBuf::from("/b")]);
    }

    #[test]
    fn test_total_size_and_contains() {
        let files: FileCollection = vec![record("/x", 10), record("/y", 5)].into_iter().collect();
        assert_eq!(files.total_size(), 15);
        assert!(files.contains(Path::new("/x")));
        assert!(!files.contains(Path::new("/z")));
        assert_eq!(files.get(Path::new("/y")).map(|r| r.size), Some(5));
    }

    #[test]
    fn test_sort_by_path_is_bytewise() {
        let mut files: FileCollection = vec![record("/a/b", 1), record("/a.b", 1)]
            .into_iter()
            .collect();
        files.sort_by_path();
        // '.' (0x2e) sorts before '/' (0x2f)
        assert_eq!(files.as_slice()[0].path, PathBuf::from("/a.b"));
    }

    #[test]
    fn test_sort_by_size_desc_ties_by_path() {
        let mut files: FileCollection = vec![record("/b", 4), record("/a", 4), record("/c", 9)]
            .into_iter()
            .collect();
        files.sort_by_size_desc();
        let paths: Vec<_> = files.iter().map(|r| r.path.to_string_lossy().into_owned()).collect();
        assert_eq!(paths, vec!["/c", "/a", "/b"]);
    }
}
