// ABOUTME: Exclude-filtered recursive copy of the source tree into scratch space.
// ABOUTME: Excluded directories are pruned wholesale and never descended into.

use super::error::BuildError;
use super::exclude::ExcludeRules;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Copy `source` into `dest`, returning the number of files copied.
///
/// Symlinks are followed so the artifact holds real files.
pub fn stage_tree(source: &Path, dest: &Path, rules: &ExcludeRules) -> Result<usize, BuildError> {
    let mut copied = 0;

    let walker = WalkDir::new(source)
        .min_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
            let excluded = rules.is_excluded(relative, entry.file_type().is_dir());
            if excluded {
                tracing::trace!("Excluding {}", relative.display());
            }
            !excluded
        });

    for entry in walker {
        let entry = entry.map_err(|e| BuildError::Stage {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| source.to_path_buf()),
            source: e.into(),
        })?;

        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| BuildError::Stage {
                path: entry.path().to_path_buf(),
                source: std::io::Error::other(e),
            })?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(stage_error(&target))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(stage_error(parent))?;
        }
        fs::copy(entry.path(), &target).map_err(stage_error(entry.path()))?;
        copied += 1;
    }

    Ok(copied)
}

/// Run [`stage_tree`] on the blocking pool.
pub async fn stage(source: PathBuf, dest: PathBuf, rules: ExcludeRules) -> Result<usize, BuildError> {
    tokio::task::spawn_blocking(move || stage_tree(&source, &dest, &rules))
        .await
        .map_err(|e| BuildError::Interrupted(e.to_string()))?
}

fn stage_error(path: &Path) -> impl FnOnce(std::io::Error) -> BuildError + '_ {
    move |source| BuildError::Stage {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, relative).unwrap();
    }

    #[test]
    fn copies_tree_without_excluded_entries() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        touch(source.path(), "index.js");
        touch(source.path(), "lib/util.js");
        touch(source.path(), ".git/HEAD");
        touch(source.path(), "build/old.zip");
        touch(source.path(), "debug.log");

        let rules = ExcludeRules::new(&[]).unwrap();
        let copied = stage_tree(source.path(), dest.path(), &rules).unwrap();

        assert_eq!(copied, 2);
        assert!(dest.path().join("index.js").is_file());
        assert!(dest.path().join("lib/util.js").is_file());
        assert!(!dest.path().join(".git").exists());
        assert!(!dest.path().join("build").exists());
        assert!(!dest.path().join("debug.log").exists());
    }

    #[test]
    fn missing_source_is_a_stage_error() {
        let dest = TempDir::new().unwrap();
        let rules = ExcludeRules::new(&[]).unwrap();
        let err = stage_tree(Path::new("/nonexistent/source"), dest.path(), &rules).unwrap_err();
        assert!(matches!(err, BuildError::Stage { .. }));
    }
}
