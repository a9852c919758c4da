//! Duplicate file detection using content hashing.
//!
//! Uses a two-phase algorithm:
//! 1. Group files by size (no I/O beyond the scan)
//! 2. Compute a full BLAKE3 hash only for files whose size is shared
//!
//! Files with a unique size are never read.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use blake3::Hasher;
use derive_builder::Builder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use stalesweep_core::{ContentHash, FileCollection, FileRecord};

/// Files above this size are hashed through a memory map.
const MMAP_THRESHOLD: u64 = 128 * 1024;

/// Configuration for duplicate detection.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct DuplicateConfig {
    /// Minimum file size to consider.
    #[builder(default = "0")]
    pub min_size: u64,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self { min_size: 0 }
    }
}

impl DuplicateConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateConfigBuilder {
        DuplicateConfigBuilder::default()
    }
}

/// Which representative set of each duplicate group a selection charges
/// against its budget.
///
/// The newest member of a group is always the kept copy and the older
/// members are always the ones reported for cleanup; the policy only decides
/// how many bytes that costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Charge every member except the most recently modified one.
    #[default]
    AllButNewest,
    /// Charge only the most recently modified member.
    NewestOnly,
}

impl DuplicatePolicy {
    /// Bytes charged for `group` under this policy.
    pub fn charged_bytes(self, group: &DuplicateGroup) -> u64 {
        match self {
            Self::AllButNewest => group.wasted_bytes(),
            Self::NewestOnly => group.newest().map_or(0, |r| r.size),
        }
    }
}

/// A group of files with identical content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Content hash shared by all files in this group.
    pub hash: ContentHash,

    /// Size of each file in bytes.
    pub size: u64,

    /// Members of the group, sorted by path.
    pub files: FileCollection,
}

impl DuplicateGroup {
    /// Get the number of duplicate files.
    pub fn count(&self) -> usize {
        self.files.len()
    }

    /// If keeping one file, how many could be deleted.
    pub fn deletable_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Space held by the redundant copies: size * (count - 1).
    pub fn wasted_bytes(&self) -> u64 {
        self.size * self.deletable_count() as u64
    }

    /// The member with the latest modification time. On a tie the member
    /// with the lowest path wins.
    pub fn newest(&self) -> Option<&FileRecord> {
        // Members are in path order and only a strictly newer time replaces
        // the current pick.
        self.files.iter().fold(None, |best: Option<&FileRecord>, record| match best {
            Some(current) if record.modified() <= current.modified() => Some(current),
            _ => Some(record),
        })
    }

    /// Every member except [`newest`](Self::newest).
    pub fn older(&self) -> impl Iterator<Item = &FileRecord> {
        let newest = self.newest().map(|r| r.path.clone());
        self.files
            .iter()
            .filter(move |r| Some(&r.path) != newest.as_ref())
    }
}

/// Duplicate file finder.
pub struct DuplicateFinder {
    config: DuplicateConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with default config.
    pub fn new() -> Self {
        Self {
            config: DuplicateConfig::default(),
        }
    }

    /// Create a new duplicate finder with custom config.
    pub fn with_config(config: DuplicateConfig) -> Self {
        Self { config }
    }

    /// Group the regular files in `files` by identical content.
    ///
    /// Groups are sorted by wasted space descending, then by first path.
    /// Files that cannot be read are left out.
    pub fn find_groups(&self, files: &FileCollection) -> Vec<DuplicateGroup> {
        let size_groups = self.group_by_size(files);
        let candidates: Vec<&FileRecord> = size_groups.into_values().flatten().collect();

        debug!(candidates = candidates.len(), "hashing same-size files");

        let hashed: Vec<(&FileRecord, ContentHash)> = candidates
            .into_par_iter()
            .filter_map(|record| match hash_file(&record.path, record.size) {
                Ok(hash) => Some((record, hash)),
                Err(err) => {
                    debug!(path = %record.path.display(), "cannot hash: {err}");
                    None
                }
            })
            .collect();

        let mut by_content: HashMap<(u64, ContentHash), Vec<FileRecord>> = HashMap::new();
        for (record, hash) in hashed {
            by_content
                .entry((record.size, hash))
                .or_default()
                .push(record.clone());
        }

        let mut groups: Vec<DuplicateGroup> = by_content
            .into_iter()
            .filter(|(_, members)| members.len() >= 2)
            .map(|((size, hash), members)| {
                let mut files = FileCollection::from_records(members);
                files.sort_by_path();
                DuplicateGroup { hash, size, files }
            })
            .collect();

        groups.sort_by(|a, b| {
            b.wasted_bytes()
                .cmp(&a.wasted_bytes())
                .then_with(|| first_path(a).cmp(first_path(b)))
        });

        debug!(groups = groups.len(), "duplicate detection finished");
        groups
    }

    /// The newest member of every duplicate group: the copy to keep.
    pub fn newest_representatives(&self, files: &FileCollection) -> FileCollection {
        self.find_groups(files)
            .iter()
            .filter_map(|group| group.newest().cloned())
            .collect()
    }

    /// All members of every duplicate group except the newest one.
    pub fn oldest_representatives(&self, files: &FileCollection) -> FileCollection {
        self.find_groups(files)
            .iter()
            .flat_map(|group| group.older().cloned().collect::<Vec<_>>())
            .collect()
    }

    /// The representative set `policy` names for the duplicate groups of
    /// `files`: the kept newest copies or the older ones.
    pub fn representatives(&self, files: &FileCollection, policy: DuplicatePolicy) -> FileCollection {
        match policy {
            DuplicatePolicy::AllButNewest => self.oldest_representatives(files),
            DuplicatePolicy::NewestOnly => self.newest_representatives(files),
        }
    }

    /// Group regular files by size, dropping sizes held by a single file.
    fn group_by_size<'a>(&self, files: &'a FileCollection) -> HashMap<u64, Vec<&'a FileRecord>> {
        let mut groups: HashMap<u64, Vec<&FileRecord>> = HashMap::new();
        for record in files.iter().filter(|r| r.is_file() && r.size >= self.config.min_size) {
            groups.entry(record.size).or_default().push(record);
        }
        groups.retain(|_, v| v.len() > 1);
        groups
    }
}

impl Default for DuplicateFinder {
    fn default() -> Self {
        Self::new()
    }
}

fn first_path(group: &DuplicateGroup) -> &std::ffi::OsStr {
    group
        .files
        .iter()
        .next()
        .map(|r| r.path.as_os_str())
        .unwrap_or_default()
}

/// Compute the full BLAKE3 hash of a file.
pub fn hash_file(path: &Path, size: u64) -> io::Result<ContentHash> {
    let mut hasher = Hasher::new();
    if size > MMAP_THRESHOLD {
        hasher.update_mmap(path)?;
    } else {
        hasher.update_reader(File::open(path)?)?;
    }
    Ok(ContentHash::new(*hasher.finalize().as_bytes()))
}
