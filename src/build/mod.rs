// ABOUTME: Artifact builder: stage, install, hook, archive.
// ABOUTME: Produces the zip shipped unchanged to every region of a deploy.

mod archive;
mod container;
mod error;
mod exclude;
mod install;
mod stage;

pub use archive::{ArchiveBuilder, archive_directory};
pub use container::CONTAINER_WORKDIR;
pub use error::BuildError;
pub use exclude::{DEFAULT_EXCLUDES, ExcludeRules, MANIFEST_FILE};
pub use install::{install_dependencies, install_on_host};
pub use stage::{stage, stage_tree};

use crate::diagnostics::{Diagnostics, Warning};
use crate::hooks::{HookContext, HookRunner, POST_INSTALL_HOOK};
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// How production dependencies get installed into the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallPolicy {
    /// Run the command on this machine.
    Host { command: Vec<String> },
    /// Run the command inside `image` with the staging directory mounted.
    Container { image: String, command: Vec<String> },
    Skip,
}

/// Everything a build needs, with paths already resolved.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub source_dir: PathBuf,
    pub exclude: Vec<String>,
    pub install: InstallPolicy,
    /// Base function name, exported to the hook.
    pub function: String,
    /// Target environment, passed to the hook.
    pub environment: String,
    pub prebuilt_dir: Option<PathBuf>,
    pub archive: Option<PathBuf>,
}

/// Where the artifact bytes came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    Precomputed(PathBuf),
    Prebuilt(PathBuf),
    Built,
}

/// A finished deployment archive.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Bytes,
    pub source: ArtifactSource,
    /// Number of files in the archive; zero when the archive was precomputed.
    pub file_count: usize,
}

impl Artifact {
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the archive as `<output_dir>/<name>[-<environment>].zip`.
    pub fn persist(
        &self,
        output_dir: &Path,
        name: &str,
        environment: Option<&str>,
    ) -> std::io::Result<PathBuf> {
        let file_name = match environment.filter(|e| !e.is_empty()) {
            Some(env) => format!("{name}-{env}.zip"),
            None => format!("{name}.zip"),
        };

        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Build the deployment archive described by `request`.
///
/// The scratch directory lives only as long as this call.
pub async fn build(
    request: &BuildRequest,
    diagnostics: &mut Diagnostics,
) -> Result<Artifact, BuildError> {
    if let Some(path) = &request.archive
        && path.is_file()
    {
        tracing::info!("Using precomputed archive {}", path.display());
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| BuildError::ReadArchive {
                path: path.clone(),
                source,
            })?;
        return Ok(Artifact {
            bytes: Bytes::from(bytes),
            source: ArtifactSource::Precomputed(path.clone()),
            file_count: 0,
        });
    }

    let (source_dir, prebuilt) = match &request.prebuilt_dir {
        Some(dir) => (dir.clone(), true),
        None => (request.source_dir.clone(), false),
    };

    if !source_dir.is_dir() {
        return Err(BuildError::SourceMissing(source_dir));
    }

    let mut rules = ExcludeRules::new(&request.exclude)?;
    if prebuilt {
        rules = rules.without_manifest();
    }

    let scratch = tempfile::Builder::new()
        .prefix("lambdeploy-")
        .tempdir()
        .map_err(BuildError::Scratch)?;
    let staging = scratch.path().to_path_buf();

    let staged = stage(source_dir.clone(), staging.clone(), rules).await?;
    tracing::info!("Staged {} file(s) from {}", staged, source_dir.display());

    if prebuilt {
        tracing::debug!("Prebuilt directory: skipping install and hook");
    } else {
        install_dependencies(&staging, &request.install, diagnostics).await?;
        run_post_install(&staging, request, diagnostics).await?;
    }

    let (bytes, file_count) = archive_directory(&staging)?;
    tracing::info!("Archived {} file(s), {} bytes", file_count, bytes.len());

    let source = if prebuilt {
        ArtifactSource::Prebuilt(source_dir)
    } else {
        ArtifactSource::Built
    };

    Ok(Artifact {
        bytes,
        source,
        file_count,
    })
}

async fn run_post_install(
    staging: &Path,
    request: &BuildRequest,
    diagnostics: &mut Diagnostics,
) -> Result<(), BuildError> {
    let runner = HookRunner::new(staging);
    if staging.join(POST_INSTALL_HOOK).is_file() && !runner.hook_exists() {
        diagnostics.warn(Warning::hook_skipped(format!(
            "{POST_INSTALL_HOOK} is not executable and was not run"
        )));
        return Ok(());
    }

    let context = HookContext {
        environment: request.environment.clone(),
        function: request.function.clone(),
    };

    match runner.run(&context).await {
        Some(result) if !result.success => Err(BuildError::PostInstallHook {
            exit_code: result.exit_code,
            output: result.combined_output(),
        }),
        _ => Ok(()),
    }
}
