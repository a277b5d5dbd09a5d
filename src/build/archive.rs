// ABOUTME: Zip archive writer for the staged build directory.
// ABOUTME: A fresh builder per build; entries are stored under forward-slash relative paths.

use super::error::BuildError;
use bytes::Bytes;
use std::fs::File;
use std::io::{self, Cursor};
use std::path::Path;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Accumulates files into an in-memory zip. Consumed by [`ArchiveBuilder::finish`].
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    entries: usize,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            entries: 0,
        }
    }

    /// Add the file at `path` as entry `name`.
    pub fn add_file(&mut self, name: &str, path: &Path) -> Result<(), BuildError> {
        let mut file = File::open(path).map_err(archive_io_error)?;
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(file_mode(&file));

        self.writer.start_file(name, options)?;
        io::copy(&mut file, &mut self.writer).map_err(archive_io_error)?;
        self.entries += 1;
        Ok(())
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn finish(self) -> Result<Bytes, BuildError> {
        let cursor = self.writer.finish()?;
        Ok(Bytes::from(cursor.into_inner()))
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Archive every non-directory file below `root`, in file-name order so the
/// same tree always yields the same entry order.
///
/// Symlinks are followed and stored as the files they point to. A link back
/// to one of its own ancestors is skipped.
pub fn archive_directory(root: &Path) -> Result<(Bytes, usize), BuildError> {
    let mut builder = ArchiveBuilder::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.loop_ancestor().is_some() => {
                tracing::warn!("Skipping symlink loop: {}", e);
                continue;
            }
            Err(e) => return Err(BuildError::Archive(e.to_string())),
        };
        if entry.file_type().is_dir() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| BuildError::Archive(e.to_string()))?;
        builder.add_file(&entry_name(relative), entry.path())?;
    }

    let entries = builder.entries();
    tracing::debug!("Archived {} file(s) from {}", entries, root.display());
    Ok((builder.finish()?, entries))
}

fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn archive_io_error(err: io::Error) -> BuildError {
    BuildError::Archive(err.to_string())
}

#[cfg(unix)]
fn file_mode(file: &File) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    file.metadata()
        .map(|m| m.permissions().mode() & 0o777)
        .unwrap_or(0o644)
}

#[cfg(not(unix))]
fn file_mode(_file: &File) -> u32 {
    0o644
}
