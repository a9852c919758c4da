//! Path exclusion.

use std::fs;
use std::io;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::warn;

/// Decides whether a scanned path is kept out of the selection.
pub trait ExcludeMatcher {
    /// Whether `path`, found under `root`, should be excluded.
    fn matches(&self, path: &Path, root: &Path) -> bool;
}

impl<F> ExcludeMatcher for F
where
    F: Fn(&Path, &Path) -> bool,
{
    fn matches(&self, path: &Path, root: &Path) -> bool {
        self(path, root)
    }
}

/// Matcher that excludes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExclusions;

impl ExcludeMatcher for NoExclusions {
    fn matches(&self, _path: &Path, _root: &Path) -> bool {
        false
    }
}

/// Glob patterns evaluated against paths relative to the scan root.
///
/// A pattern that starts with `/` only matches from the root; any other
/// pattern matches at any depth. A pattern that matches a directory also
/// matches everything below it. `*` and `?` never cross a `/`, `**` does.
#[derive(Debug, Clone)]
pub struct GlobExcluder {
    patterns: Vec<String>,
    set: GlobSet,
}

impl GlobExcluder {
    /// Compile `patterns`. Patterns that fail to compile are logged and
    /// ignored.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut accepted = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            let (anchored, body) = match pattern.strip_prefix('/') {
                Some(rest) => (true, rest),
                None => (false, pattern),
            };
            let body = body.trim_end_matches('/');
            if body.is_empty() {
                warn!(pattern, "ignoring empty exclude pattern");
                continue;
            }

            let expanded = if anchored {
                [body.to_string(), format!("{body}/**")]
            } else {
                [format!("**/{body}"), format!("**/{body}/**")]
            };

            let compiled: Result<Vec<_>, _> = expanded
                .iter()
                .map(|p| GlobBuilder::new(p).literal_separator(true).build())
                .collect();
            match compiled {
                Ok(globs) => {
                    for glob in globs {
                        builder.add(glob);
                    }
                    accepted.push(pattern.to_string());
                }
                Err(err) => warn!(pattern, "ignoring invalid exclude pattern: {err}"),
            }
        }

        let set = builder.build().unwrap_or_else(|err| {
            warn!("exclude patterns could not be combined: {err}");
            GlobSet::empty()
        });

        Self {
            patterns: accepted,
            set,
        }
    }

    /// Read patterns from a file, one per line.
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::new(Self::read_patterns(&contents)))
    }

    /// Pattern lines of `contents`, without blank lines and `#` comments.
    pub fn read_patterns(contents: &str) -> Vec<&str> {
        contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    }

    /// The patterns that compiled.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether no pattern is active.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl ExcludeMatcher for GlobExcluder {
    fn matches(&self, path: &Path, root: &Path) -> bool {
        match path.strip_prefix(root) {
            Ok(relative) => self.set.is_match(relative),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn excluded(patterns: &[&str], path: &str) -> bool {
        GlobExcluder::new(patterns).matches(&Path::new("/root").join(path), Path::new("/root"))
    }

    #[test]
    fn test_unanchored_matches_any_depth() {
        assert!(excluded(&["*.log"], "app.log"));
        assert!(excluded(&["*.log"], "var/run/app.log"));
        assert!(!excluded(&["*.log"], "app.log.gz"));
    }

    #[test]
    fn test_anchored_matches_only_at_root() {
        assert!(excluded(&["/build"], "build/out.o"));
        assert!(!excluded(&["/build"], "src/build/out.o"));
        assert!(excluded(&["build"], "src/build/out.o"));
    }

    #[test]
    fn test_star_does_not_cross_separator() {
        assert!(!excluded(&["/src/*.rs"], "src/nested/lib.rs"));
        assert!(excluded(&["/src/*.rs"], "src/lib.rs"));
        assert!(excluded(&["/src/**/*.rs"], "src/nested/lib.rs"));
    }

    #[test]
    fn test_directory_pattern_excludes_contents() {
        assert!(excluded(&["cache/"], "home/user/cache/blob"));
        assert!(excluded(&["node_modules"], "web/node_modules/pkg/index.js"));
    }

    #[test]
    fn test_invalid_and_empty_patterns_are_ignored() {
        let excluder = GlobExcluder::new(["[", "/", "", "*.tmp"]);
        assert_eq!(excluder.patterns(), &["*.tmp".to_string()]);
        assert!(excluder.matches(Path::new("/root/x.tmp"), Path::new("/root")));
    }

    #[test]
    fn test_path_outside_root_never_matches() {
        let excluder = GlobExcluder::new(["*"]);
        assert!(!excluder.matches(Path::new("/elsewhere/file"), Path::new("/root")));
    }

    #[test]
    fn test_read_patterns_skips_comments() {
        let contents = "# caches\n*.tmp\n\n   # indented comment\n/build/\n";
        assert_eq!(GlobExcluder::read_patterns(contents), vec!["*.tmp", "/build/"]);
    }

    #[test]
    fn test_closure_matcher() {
        let matcher = |path: &Path, _root: &Path| path.ends_with("skip.me");
        assert!(matcher.matches(Path::new("/r/skip.me"), Path::new("/r")));
        assert!(!NoExclusions.matches(Path::new("/r/skip.me"), Path::new("/r")));
    }
}
