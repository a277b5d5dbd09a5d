// ABOUTME: Application-wide error types for lambdeploy.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::build::BuildError;
use crate::desired::DesiredStateError;
use crate::types::FunctionNameError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid function name: {0}")]
    FunctionName(#[from] FunctionNameError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    DesiredState(#[from] DesiredStateError),

    #[error("deployment failed in {failed} of {total} region(s)")]
    DeployFailed { failed: usize, total: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
