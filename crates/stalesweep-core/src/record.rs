//! File record types captured by a scan.

use std::fs::{FileType, Metadata};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// BLAKE3 content hash for duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Timestamps read from the entry's metadata at scan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Last modification time.
    pub modified: SystemTime,
    /// Last access time. Falls back to `modified` where the platform has none.
    pub accessed: SystemTime,
}

impl Timestamps {
    /// Create timestamps from explicit times.
    pub fn new(modified: SystemTime, accessed: SystemTime) -> Self {
        Self { modified, accessed }
    }

    /// Read timestamps from metadata.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
        let accessed = metadata.accessed().unwrap_or(modified);
        Self { modified, accessed }
    }

    /// Access time as whole seconds since the Unix epoch (0 for earlier times).
    pub fn accessed_secs(&self) -> u64 {
        self.accessed
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Type of file system entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link (never followed).
    Symlink,
    /// Other file types (sockets, devices, etc.).
    Other,
}

impl EntryKind {
    /// Classify a file type as returned by `lstat`.
    pub fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }

    /// Check if this is a symlink.
    pub fn is_symlink(&self) -> bool {
        matches!(self, Self::Symlink)
    }
}

bitflags! {
    /// Entry kinds to keep in a scan result.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct KindMask: u8 {
        const FILE = 0b001;
        const DIR = 0b010;
        const SYMLINK = 0b100;
        const ANY = Self::FILE.bits() | Self::DIR.bits() | Self::SYMLINK.bits();
    }
}

impl KindMask {
    /// Whether entries of `kind` pass this mask.
    pub fn admits(&self, kind: EntryKind) -> bool {
        match kind {
            EntryKind::File => self.contains(Self::FILE),
            EntryKind::Directory => self.contains(Self::DIR),
            EntryKind::Symlink => self.contains(Self::SYMLINK),
            EntryKind::Other => false,
        }
    }
}

impl Default for KindMask {
    fn default() -> Self {
        Self::ANY
    }
}

/// A single entry found by a scan.
///
/// The path is the identity of a record. Records are snapshots: nothing
/// re-reads the filesystem after the scan created them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path of the entry.
    pub path: PathBuf,

    /// Entry type.
    pub kind: EntryKind,

    /// Size in bytes as reported by `lstat`.
    pub size: u64,

    /// Metadata timestamps.
    pub timestamps: Timestamps,
}

impl FileRecord {
    /// Create a new record.
    pub fn new(
        path: impl Into<PathBuf>,
        kind: EntryKind,
        size: u64,
        timestamps: Timestamps,
    ) -> Self {
        Self {
            path: path.into(),
            kind,
            size,
            timestamps,
        }
    }

    /// Create a regular file record.
    pub fn file(path: impl Into<PathBuf>, size: u64, timestamps: Timestamps) -> Self {
        Self::new(path, EntryKind::File, size, timestamps)
    }

    /// Build a record from `lstat` metadata.
    pub fn from_metadata(path: impl Into<PathBuf>, metadata: &Metadata) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::from_file_type(metadata.file_type()),
            size: metadata.len(),
            timestamps: Timestamps::from_metadata(metadata),
        }
    }

    /// Stat `path` without following symlinks and build a record.
    pub fn stat(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let metadata = std::fs::symlink_metadata(&path)?;
        Ok(Self::from_metadata(path, &metadata))
    }

    /// Path of this entry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if this record is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Check if this record is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Last modification time.
    pub fn modified(&self) -> SystemTime {
        self.timestamps.modified
    }

    /// Last access time.
    pub fn accessed(&self) -> SystemTime {
        self.timestamps.accessed
    }
}
