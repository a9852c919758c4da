//! Scan configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::record::KindMask;

/// Configuration for scanning operations.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Number of listing workers (0 = available parallelism).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Entry kinds to return.
    #[builder(default = "KindMask::ANY")]
    #[serde(default)]
    pub kinds: KindMask,

    /// Capacity of the job and result queues.
    #[builder(default = "100")]
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    100
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if self.queue_capacity == Some(0) {
            return Err("Queue capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            threads: 0,
            kinds: KindMask::ANY,
            queue_capacity: default_queue_capacity(),
        }
    }

    /// Restrict the result to the given kinds.
    pub fn with_kinds(mut self, kinds: KindMask) -> Self {
        self.kinds = kinds;
        self
    }

    /// Number of worker threads to run.
    pub fn worker_count(&self) -> usize {
        match self.threads {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .root("/home/user")
            .threads(4usize)
            .kinds(KindMask::FILE)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert_eq!(config.worker_count(), 4);
        assert_eq!(config.kinds, KindMask::FILE);
        assert_eq!(config.queue_capacity, 100);
    }

    #[test]
    fn test_builder_rejects_bad_input() {
        assert!(ScanConfig::builder().build().is_err());
        assert!(ScanConfig::builder().root("").build().is_err());
        assert!(ScanConfig::builder()
            .root("/tmp")
            .queue_capacity(0usize)
            .build()
            .is_err());
    }

    #[test]
    fn test_auto_worker_count() {
        let config = ScanConfig::new("/tmp");
        assert_eq!(config.threads, 0);
        assert!(config.worker_count() >= 1);
        assert_eq!(config.kinds, KindMask::ANY);
    }
}
