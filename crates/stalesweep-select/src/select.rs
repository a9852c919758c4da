//! Selection pipeline: scan, exclude, deduplicate, filter, rank.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::info;

use stalesweep_core::{FileCollection, KindMask, ScanConfig, ScanError};
use stalesweep_scan::BfsScanner;

use crate::duplicates::{DuplicateFinder, DuplicatePolicy};
use crate::exclude::ExcludeMatcher;
use crate::priority::PriorityFilter;
use crate::ranked::Selection;

/// Configuration for a selection run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SelectConfig {
    /// Directory to clean up.
    pub root: PathBuf,

    /// Maximum number of bytes to select.
    pub budget: u64,

    /// Files accessed more recently than this are never selected.
    #[builder(default = "Duration::ZERO")]
    #[serde(default)]
    pub min_staleness: Duration,

    /// Report the older copies of duplicate files ahead of everything else.
    /// The newest copy of each group is never selected.
    #[builder(default = "true")]
    pub deduplicate: bool,

    /// How reported duplicates are charged against the budget.
    #[builder(default)]
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// Charge the reported duplicates against the budget.
    #[builder(default = "true")]
    pub deduct_duplicates: bool,

    /// Number of listing workers (0 = available parallelism).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Instant staleness is measured from.
    #[builder(default = "SystemTime::now()")]
    pub reference_time: SystemTime,
}

impl SelectConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl SelectConfig {
    /// Create a new select config builder.
    pub fn builder() -> SelectConfigBuilder {
        SelectConfigBuilder::default()
    }

    /// Config with defaults for everything but the root and the budget.
    pub fn new(root: impl Into<PathBuf>, budget: u64) -> Self {
        Self {
            root: root.into(),
            budget,
            min_staleness: Duration::ZERO,
            deduplicate: true,
            duplicate_policy: DuplicatePolicy::default(),
            deduct_duplicates: true,
            threads: 0,
            reference_time: SystemTime::now(),
        }
    }

    fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            root: self.root.clone(),
            threads: self.threads,
            kinds: KindMask::FILE,
            ..ScanConfig::default()
        }
    }
}

/// Runs the full selection pipeline.
pub struct Selector {
    config: SelectConfig,
    scanner: BfsScanner,
    duplicates: DuplicateFinder,
}

impl Selector {
    /// Create a selector for `config`.
    pub fn new(config: SelectConfig) -> Self {
        Self {
            config,
            scanner: BfsScanner::new(),
            duplicates: DuplicateFinder::new(),
        }
    }

    /// Get the selection config.
    pub fn config(&self) -> &SelectConfig {
        &self.config
    }

    /// The scanner, for subscribing to progress before [`select`](Self::select).
    pub fn scanner(&self) -> &BfsScanner {
        &self.scanner
    }

    /// Select files under the configured root.
    ///
    /// Duplicates (every copy but the newest) come first, largest first,
    /// followed by the files the priority filter picked from the files that
    /// have no duplicate. Ranks are assigned in that
    /// order. A scan failure aborts the run.
    pub fn select<E>(&self, exclude: &E) -> Result<Selection, ScanError>
    where
        E: ExcludeMatcher + ?Sized,
    {
        let config = &self.config;
        let result = self.scanner.scan(&config.scan_config())?;
        let root = result.root.clone();
        let warnings = result.warnings;

        let mut pool = result.records;
        let scanned = pool.len();
        pool.retain(|r| !exclude.matches(&r.path, &root));
        let excluded = scanned - pool.len();

        let mut budget = config.budget;
        let duplicates = if config.deduplicate {
            let groups = self.duplicates.find_groups(&pool);

            // No member of a group competes in the priority filter, so the
            // kept copy can never be picked from there.
            let members: FileCollection = groups
                .iter()
                .flat_map(|group| group.files.iter().cloned())
                .collect();
            pool = pool.difference(&members);

            if config.deduct_duplicates {
                let charged: u64 = groups
                    .iter()
                    .map(|group| config.duplicate_policy.charged_bytes(group))
                    .sum();
                budget = budget.saturating_sub(charged);
            }

            let mut dups: FileCollection = groups
                .iter()
                .flat_map(|group| group.older().cloned().collect::<Vec<_>>())
                .collect();
            dups.sort_by_size_desc();
            dups
        } else {
            FileCollection::new()
        };

        let filtered = PriorityFilter::with_reference_time(config.reference_time).filter(
            &pool,
            budget,
            config.min_staleness,
        );

        info!(
            scanned,
            excluded,
            duplicates = duplicates.len(),
            selected = filtered.len(),
            "selection finished"
        );

        Ok(Selection::ranked(root, duplicates, filtered, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclude::NoExclusions;

    #[test]
    fn test_config_defaults() {
        let config = SelectConfig::builder()
            .root("/data")
            .budget(1024u64)
            .build()
            .unwrap();

        assert!(config.deduplicate);
        assert!(config.deduct_duplicates);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::AllButNewest);
        assert_eq!(config.min_staleness, Duration::ZERO);
        assert_eq!(config.scan_config().kinds, KindMask::FILE);
    }

    #[test]
    fn test_config_requires_root_and_budget() {
        assert!(SelectConfig::builder().budget(1u64).build().is_err());
        assert!(SelectConfig::builder().root("").budget(1u64).build().is_err());
        assert!(SelectConfig::builder().root("/data").build().is_err());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp = tempfile::TempDir::new().unwrap();
        let selector = Selector::new(SelectConfig::new(temp.path().join("missing"), 10));
        assert!(selector.select(&NoExclusions).is_err());
    }
}
