// ABOUTME: Host-side dependency install run inside the staging directory.
// ABOUTME: Warns when native modules built here may not load on the target platform.

use super::container::install_in_container;
use super::error::BuildError;
use super::InstallPolicy;
use crate::diagnostics::{Diagnostics, Warning};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Platform the deployed function executes on.
const TARGET_OS: &str = "linux";
const TARGET_ARCH: &str = "x86_64";

/// Install dependencies in `staging` according to `policy`.
pub async fn install_dependencies(
    staging: &Path,
    policy: &InstallPolicy,
    diagnostics: &mut Diagnostics,
) -> Result<(), BuildError> {
    match policy {
        InstallPolicy::Skip => {
            tracing::debug!("Dependency install skipped");
            Ok(())
        }
        InstallPolicy::Container { image, command } => {
            tracing::info!("Installing dependencies in container {}", image);
            install_in_container(staging, image, command).await
        }
        InstallPolicy::Host { command } => {
            if !host_matches_target() {
                diagnostics.warn(Warning::native_extensions(format!(
                    "installing on {}/{}; native modules may not load on {}/{}. \
                     Set build.docker_image to install in a matching container",
                    std::env::consts::OS,
                    std::env::consts::ARCH,
                    TARGET_OS,
                    TARGET_ARCH
                )));
            }
            install_on_host(staging, command).await
        }
    }
}

fn host_matches_target() -> bool {
    std::env::consts::OS == TARGET_OS && std::env::consts::ARCH == TARGET_ARCH
}

/// Run `command` with `staging` as the working directory.
pub async fn install_on_host(staging: &Path, command: &[String]) -> Result<(), BuildError> {
    let Some((program, args)) = command.split_first() else {
        return Err(BuildError::EmptyInstallCommand);
    };

    tracing::info!("Installing dependencies: {}", command.join(" "));

    let output = Command::new(program)
        .args(args)
        .current_dir(staging)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| BuildError::InstallSpawn {
            program: program.clone(),
            source,
        })?;

    if output.status.success() {
        return Ok(());
    }

    let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    Err(BuildError::InstallFailed {
        exit_code: output.status.code().map(i64::from),
        output: combined.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn host_install_runs_in_staging_dir() {
        let dir = TempDir::new().unwrap();

        install_on_host(dir.path(), &sh("touch installed")).await.unwrap();

        assert!(dir.path().join("installed").exists());
    }

    #[tokio::test]
    async fn host_install_reports_exit_code_and_output() {
        let dir = TempDir::new().unwrap();

        let err = install_on_host(dir.path(), &sh("echo broken >&2; exit 3"))
            .await
            .unwrap_err();

        match err {
            BuildError::InstallFailed { exit_code, output } => {
                assert_eq!(exit_code, Some(3));
                assert!(output.contains("broken"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = install_on_host(dir.path(), &[]).await.unwrap_err();
        assert!(matches!(err, BuildError::EmptyInstallCommand));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let dir = TempDir::new().unwrap();
        let err = install_on_host(dir.path(), &["lambdeploy-no-such-tool".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::InstallSpawn { .. }));
    }

    #[tokio::test]
    async fn skip_policy_does_nothing() {
        let dir = TempDir::new().unwrap();
        let mut diagnostics = Diagnostics::default();

        install_dependencies(dir.path(), &InstallPolicy::Skip, &mut diagnostics)
            .await
            .unwrap();

        assert!(!diagnostics.has_warnings());
    }
}
