//! Move selected files out of a tree.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use filetime::{FileTime, set_file_times};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use stalesweep_core::{FileCollection, FileRecord};

use crate::error::MoveError;
use crate::progress::{MoveProgress, MoveReport};

#[cfg(unix)]
const NEW_DIR_MODE: u32 = 0o700;

/// Options for move operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveOptions {
    /// Recreate each file's directory relative to the source root under the
    /// destination. When false every file lands directly in the destination.
    pub preserve_structure: bool,
}

impl Default for MoveOptions {
    fn default() -> Self {
        Self {
            preserve_structure: true,
        }
    }
}

impl MoveOptions {
    /// Options that drop every file directly into the destination.
    pub fn flat() -> Self {
        Self {
            preserve_structure: false,
        }
    }
}

/// Move `files` from under `source_root` into `dest_root`.
///
/// Stops at the first failure. Files moved before it are not put back.
pub fn move_files(
    source_root: &Path,
    files: &FileCollection,
    dest_root: &Path,
    options: &MoveOptions,
) -> Result<MoveReport, MoveError> {
    move_files_with_progress(source_root, files, dest_root, options, |_| {})
}

/// Like [`move_files`], calling `on_progress` before and after each file.
pub fn move_files_with_progress(
    source_root: &Path,
    files: &FileCollection,
    dest_root: &Path,
    options: &MoveOptions,
    mut on_progress: impl FnMut(&MoveProgress),
) -> Result<MoveReport, MoveError> {
    let mut progress = MoveProgress::new(files.len(), files.total_size());
    let mut report = MoveReport::default();

    for record in files {
        let dest = destination_for(source_root, record, dest_root, options)?;

        progress.set_current_file(Some(record.path.clone()));
        on_progress(&progress);

        let bytes = move_file(&record.path, &dest)?;
        debug!(from = %record.path.display(), to = %dest.display(), bytes, "moved");

        progress.complete_file(bytes);
        on_progress(&progress);
        report.bytes_moved += bytes;
        report.moved.push((record.path.clone(), dest));
    }

    Ok(report)
}

/// Where `record` goes under `dest_root`.
pub fn destination_for(
    source_root: &Path,
    record: &FileRecord,
    dest_root: &Path,
    options: &MoveOptions,
) -> Result<PathBuf, MoveError> {
    if options.preserve_structure {
        let relative = record
            .path
            .strip_prefix(source_root)
            .map_err(|_| MoveError::OutsideRoot {
                path: record.path.clone(),
                root: source_root.to_path_buf(),
            })?;
        Ok(dest_root.join(relative))
    } else {
        let name = record.path.file_name().ok_or_else(|| MoveError::NoFileName {
            path: record.path.clone(),
        })?;
        Ok(dest_root.join(name))
    }
}

/// Copy `source` to a new file at `dest`, carry over permissions and
/// modification time, then remove `source`. Returns the bytes copied.
fn move_file(source: &Path, dest: &Path) -> Result<u64, MoveError> {
    let mut src = File::open(source).map_err(|e| MoveError::io(source, e))?;
    let metadata = src.metadata().map_err(|e| MoveError::io(source, e))?;

    if let Some(parent) = dest.parent() {
        create_dirs(parent).map_err(|e| MoveError::io(parent, e))?;
    }

    let mut out = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|e| MoveError::io(dest, e))?;

    let copied = io::copy(&mut src, &mut out).and_then(|bytes| {
        drop(out);
        fs::set_permissions(dest, metadata.permissions())?;
        let mtime = FileTime::from_last_modification_time(&metadata);
        set_file_times(dest, mtime, mtime)?;
        Ok(bytes)
    });
    drop(src);

    let bytes = match copied {
        Ok(bytes) => bytes,
        Err(err) => {
            // The source is still in place; drop the incomplete copy.
            if let Err(cleanup) = fs::remove_file(dest) {
                warn!(path = %dest.display(), "cannot remove incomplete copy: {cleanup}");
            }
            return Err(MoveError::io(dest, err));
        }
    };

    fs::remove_file(source).map_err(|e| MoveError::io(source, e))?;
    Ok(bytes)
}

fn create_dirs(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(NEW_DIR_MODE);
    }
    builder.create(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(path: PathBuf) -> FileRecord {
        FileRecord::stat(path).unwrap()
    }

    #[test]
    fn test_destination_structured_and_flat() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        fs::write(&file, "x").unwrap();
        let rec = FileRecord::stat(&file).unwrap();
        let nested = FileRecord::new(
            temp.path().join("deep/b.txt"),
            rec.kind,
            rec.size,
            rec.timestamps,
        );

        let dest = Path::new("/dest");
        assert_eq!(
            destination_for(temp.path(), &nested, dest, &MoveOptions::default()).unwrap(),
            dest.join("deep/b.txt")
        );
        assert_eq!(
            destination_for(temp.path(), &nested, dest, &MoveOptions::flat()).unwrap(),
            dest.join("b.txt")
        );
    }

    #[test]
    fn test_outside_root_is_rejected() {
        let src = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let file = other.path().join("stray.txt");
        fs::write(&file, "x").unwrap();

        let err = destination_for(
            src.path(),
            &record(file),
            Path::new("/dest"),
            &MoveOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::OutsideRoot { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_new_directories_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("x/y");
        create_dirs(&dir).unwrap();
        let mode = fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode & !NEW_DIR_MODE, 0);
    }

    #[test]
    fn test_failed_copy_leaves_no_destination() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("unreadable");
        fs::create_dir(&source).unwrap();
        let dest = temp.path().join("out/unreadable");

        // Opening a directory succeeds but reading from it does not.
        let err = move_file(&source, &dest).unwrap_err();
        assert!(matches!(err, MoveError::Io { .. }));
        assert!(!dest.exists());
        assert!(source.exists());

        // A retry reports the read failure again, not an existing destination.
        let err = move_file(&source, &dest).unwrap_err();
        assert!(matches!(err, MoveError::Io { .. }));
    }
}
