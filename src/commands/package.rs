// ABOUTME: Package command implementation.
// ABOUTME: Builds the artifact and writes it next to the project without deploying.

use lambdeploy::build::build;
use lambdeploy::config::Config;
use lambdeploy::diagnostics::Diagnostics;
use lambdeploy::error::Result;
use lambdeploy::output::Output;
use std::path::{Path, PathBuf};

/// Build the archive and write it to `<output_dir>/<name>[-<environment>].zip`.
pub async fn package(
    config: Config,
    base: &Path,
    output_dir: Option<PathBuf>,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let mut diag = Diagnostics::default();

    let name = config.function_name()?;
    output.progress(&format!("Packaging {name}..."));

    let artifact = build(&config.build_request(base), &mut diag).await?;

    let dir = output_dir.unwrap_or_else(|| base.join(&config.build.output_dir));
    let path = artifact.persist(
        &dir,
        &config.function.name,
        config.function.environment.as_deref(),
    )?;

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    output.success(&format!(
        "Wrote {} ({} bytes)",
        path.display(),
        artifact.len()
    ));
    Ok(())
}
