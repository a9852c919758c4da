//! Breadth-first directory scanner with a bounded worker pool.
//!
//! Each generation lists one level of directories. Workers pull directories
//! from a bounded job queue and push every entry they find, already stat'ed,
//! into a bounded result queue. A generation ends when every worker has
//! exited; the directories it found become the next generation.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use crossbeam::channel::{Receiver, Sender, bounded};
use tokio::sync::broadcast;
use tracing::{debug, info};

use stalesweep_core::{
    FileCollection, FileRecord, ScanConfig, ScanError, ScanResult, ScanStats, ScanWarning,
};

use crate::progress::ScanProgress;

/// What a worker reports for a single directory entry.
enum Discovery {
    Entry(FileRecord),
    Skipped(ScanWarning),
}

/// Parallel scanner that expands a tree one level at a time.
pub struct BfsScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl BfsScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to per-generation progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan the tree under `config.root`.
    ///
    /// Fails only when the root itself cannot be resolved or is not a
    /// directory. Anything unreadable below the root is skipped and reported
    /// in [`ScanResult::warnings`].
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanResult, ScanError> {
        let start = Instant::now();
        let root = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;

        let root_metadata = fs::metadata(&root).map_err(|e| ScanError::io(&root, e))?;
        if !root_metadata.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        let workers = config.worker_count();
        let mut stats = ScanStats::new();
        let mut warnings = Vec::new();
        let mut discovered: Vec<FileRecord> = Vec::new();
        let mut generation = vec![root.clone()];

        while !generation.is_empty() {
            stats.generations += 1;
            debug!(
                generation = stats.generations,
                dirs = generation.len(),
                "listing generation"
            );

            let found = scan_generation(generation, workers, config.queue_capacity);
            let mut next = Vec::new();

            for item in found {
                match item {
                    Discovery::Entry(record) => {
                        stats.record(&record);
                        if record.is_dir() {
                            next.push(record.path.clone());
                        }
                        discovered.push(record);
                    }
                    Discovery::Skipped(warning) => {
                        debug!(path = %warning.path.display(), "skipping: {}", warning.message);
                        warnings.push(warning);
                    }
                }
            }

            let _ = self.progress_tx.send(ScanProgress {
                files_scanned: stats.total_files,
                dirs_scanned: stats.total_dirs,
                bytes_scanned: stats.total_size,
                generation: stats.generations,
                pending_dirs: next.len(),
                errors_count: warnings.len() as u64,
                elapsed: start.elapsed(),
            });

            generation = next;
        }

        let records: FileCollection = discovered
            .into_iter()
            .filter(|r| config.kinds.admits(r.kind))
            .collect();

        let scan_duration = start.elapsed();
        info!(
            root = %root.display(),
            entries = stats.total_entries(),
            kept = records.len(),
            skipped = warnings.len(),
            "scan finished in {:.2}s",
            scan_duration.as_secs_f64()
        );

        Ok(ScanResult::new(
            root,
            records,
            config.clone(),
            stats,
            scan_duration,
            warnings,
        ))
    }
}

impl Default for BfsScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// List every directory in `dirs` and return what was found.
///
/// Returns only after all workers have exited, so no listing of the next
/// generation can overlap with this one.
fn scan_generation(dirs: Vec<PathBuf>, workers: usize, capacity: usize) -> Vec<Discovery> {
    let workers = workers.clamp(1, dirs.len().max(1));
    let (job_tx, job_rx) = bounded::<PathBuf>(capacity);
    let (result_tx, result_rx) = bounded::<Discovery>(capacity);

    thread::scope(|s| {
        for _ in 0..workers {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            s.spawn(move || list_worker(jobs, results));
        }
        // Workers hold the only remaining handles; the result queue closes
        // once the last worker returns.
        drop(job_rx);
        drop(result_tx);

        s.spawn(move || {
            for dir in dirs {
                if job_tx.send(dir).is_err() {
                    break;
                }
            }
        });

        result_rx.iter().collect()
    })
}

/// Consume directories from `jobs` until the queue is closed.
fn list_worker(jobs: Receiver<PathBuf>, results: Sender<Discovery>) {
    for dir in jobs.iter() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                if results
                    .send(Discovery::Skipped(ScanWarning::read_error(&dir, &err)))
                    .is_err()
                {
                    return;
                }
                continue;
            }
        };

        for entry in entries {
            let item = match entry {
                Ok(entry) => {
                    let path = entry.path();
                    // DirEntry::metadata does not traverse symlinks.
                    match entry.metadata() {
                        Ok(metadata) => Discovery::Entry(FileRecord::from_metadata(path, &metadata)),
                        Err(err) => Discovery::Skipped(ScanWarning::metadata_error(path, &err)),
                    }
                }
                Err(err) => Discovery::Skipped(ScanWarning::read_error(&dir, &err)),
            };

            if results.send(item).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stalesweep_core::KindMask;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another file here").unwrap();

        temp
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_test_tree();
        let config = ScanConfig::new(temp.path());

        let result = BfsScanner::new().scan(&config).unwrap();

        assert_eq!(result.stats.total_files, 4);
        assert_eq!(result.stats.total_dirs, 3);
        assert_eq!(result.stats.total_size, 5 + 17 + 4 + 17);
        assert_eq!(result.records.len(), 7);
        // root listing, then dir1 + dir2, then subdir
        assert_eq!(result.stats.generations, 3);
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_root_not_in_result() {
        let temp = create_test_tree();
        let result = BfsScanner::new().scan(&ScanConfig::new(temp.path())).unwrap();
        assert!(!result.records.contains(&result.root));
        assert!(result.records.iter().all(|r| r.path.starts_with(&result.root)));
    }

    #[test]
    fn test_single_worker_matches_many() {
        let temp = create_test_tree();
        let scanner = BfsScanner::new();

        let mut one = scanner
            .scan(&ScanConfig {
                threads: 1,
                ..ScanConfig::new(temp.path())
            })
            .unwrap()
            .into_records();
        let mut many = scanner
            .scan(
                &ScanConfig::builder()
                    .root(temp.path())
                    .threads(8usize)
                    .queue_capacity(1usize)
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .into_records();

        one.sort_by_path();
        many.sort_by_path();
        let one: Vec<_> = one.iter().map(|r| r.path.clone()).collect();
        let many: Vec<_> = many.iter().map(|r| r.path.clone()).collect();
        assert_eq!(one, many);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let config = ScanConfig::new(temp.path().join("does-not-exist"));
        let err = BfsScanner::new().scan(&config).unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_file_root_is_rejected() {
        let temp = create_test_tree();
        let config = ScanConfig::new(temp.path().join("file1.txt"));
        let err = BfsScanner::new().scan(&config).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
    }

    #[test]
    fn test_progress_is_broadcast_per_generation() {
        let temp = create_test_tree();
        let scanner = BfsScanner::new();
        let mut rx = scanner.subscribe();

        scanner.scan(&ScanConfig::new(temp.path())).unwrap();

        let mut updates = Vec::new();
        while let Ok(progress) = rx.try_recv() {
            updates.push(progress);
        }
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].generation, 1);
        assert!(updates.last().unwrap().is_final());
        assert_eq!(updates.last().unwrap().files_scanned, 4);
    }
}
