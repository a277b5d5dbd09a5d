// ABOUTME: Error types for artifact builds.
// ABOUTME: Any of these aborts the build; no partial artifact is produced.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("source directory not found: {0}")]
    SourceMissing(PathBuf),

    #[error("invalid exclude pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("failed to create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("failed to stage {path}: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dependency install command is empty")]
    EmptyInstallCommand,

    #[error("failed to run {program}: {source}")]
    InstallSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("dependency install failed with exit code {exit_code:?}:\n{output}")]
    InstallFailed {
        exit_code: Option<i64>,
        output: String,
    },

    #[error("container install failed: {0}")]
    Container(String),

    #[error("post-install hook failed with exit code {exit_code:?}:\n{output}")]
    PostInstallHook {
        exit_code: Option<i32>,
        output: String,
    },

    #[error("failed to write archive: {0}")]
    Archive(String),

    #[error("failed to read archive {path}: {source}")]
    ReadArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("build step interrupted: {0}")]
    Interrupted(String),
}

impl From<zip::result::ZipError> for BuildError {
    fn from(err: zip::result::ZipError) -> Self {
        BuildError::Archive(err.to_string())
    }
}

impl From<bollard::errors::Error> for BuildError {
    fn from(err: bollard::errors::Error) -> Self {
        BuildError::Container(err.to_string())
    }
}
