// ABOUTME: File exclusion rules applied while staging the source tree.
// ABOUTME: Built-in excludes plus caller globs; the root manifest is kept unless prebuilt.

use super::error::BuildError;
use glob::{MatchOptions, Pattern};
use std::path::Path;

/// Package manifest that is always shipped from the source root.
pub const MANIFEST_FILE: &str = "package.json";

/// Always excluded: VCS metadata, editor leftovers, prior build output,
/// local-only env files and logs.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git*",
    ".hg/",
    ".svn/",
    "*.swp",
    "*~",
    ".editorconfig",
    "/.lambda/",
    "/build/",
    "deploy.env",
    ".env",
    "*.log",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct ExcludePattern {
    pattern: Pattern,
    /// Matched against the root-relative path instead of the file name.
    anchored: bool,
    dir_only: bool,
}

impl ExcludePattern {
    fn parse(raw: &str) -> Result<Self, BuildError> {
        let dir_only = raw.ends_with('/');
        let trimmed = raw.trim_end_matches('/');
        let anchored = trimmed.contains('/');
        let trimmed = trimmed.trim_start_matches('/');

        let pattern = Pattern::new(trimmed).map_err(|e| BuildError::InvalidPattern {
            pattern: raw.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            pattern,
            anchored,
            dir_only,
        })
    }

    fn matches(&self, relative: &Path, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }

        if self.anchored {
            self.pattern.matches_path_with(relative, MATCH_OPTIONS)
        } else {
            relative
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| self.pattern.matches_with(name, MATCH_OPTIONS))
        }
    }
}

/// Decides which entries of the source tree end up in the artifact.
#[derive(Debug, Clone)]
pub struct ExcludeRules {
    patterns: Vec<ExcludePattern>,
    keep_manifest: bool,
}

impl ExcludeRules {
    /// Built-in excludes plus `extra`. Each extra entry may hold several
    /// whitespace-separated globs.
    pub fn new(extra: &[String]) -> Result<Self, BuildError> {
        let patterns = DEFAULT_EXCLUDES
            .iter()
            .copied()
            .chain(extra.iter().flat_map(|s| s.split_whitespace()))
            .map(ExcludePattern::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            keep_manifest: true,
        })
    }

    /// Stop forcing the root manifest in. Used for prebuilt directories, which
    /// ship exactly what they contain.
    pub fn without_manifest(mut self) -> Self {
        self.keep_manifest = false;
        self
    }

    /// `relative` is the entry's path below the staging root.
    pub fn is_excluded(&self, relative: &Path, is_dir: bool) -> bool {
        if self.keep_manifest && !is_dir && relative == Path::new(MANIFEST_FILE) {
            return false;
        }

        self.patterns.iter().any(|p| p.matches(relative, is_dir))
    }
}
