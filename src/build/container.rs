// ABOUTME: Runs the dependency install inside a container that matches the target runtime.
// ABOUTME: The staging directory is bind-mounted so installed modules land in the artifact.

use super::error::BuildError;
use bollard::Docker;
use bollard::models::{ContainerCreateBody, HostConfig};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, LogsOptions, RemoveContainerOptions,
    WaitContainerOptions,
};
use futures::StreamExt;
use std::path::Path;

/// Mount point of the staging directory inside the container.
pub const CONTAINER_WORKDIR: &str = "/var/task";

/// Install dependencies in `staging` by running `command` inside `image`.
pub async fn install_in_container(
    staging: &Path,
    image: &str,
    command: &[String],
) -> Result<(), BuildError> {
    if command.is_empty() {
        return Err(BuildError::EmptyInstallCommand);
    }

    let client = Docker::connect_with_local_defaults()?;
    ensure_image(&client, image).await?;

    let body = ContainerCreateBody {
        image: Some(image.to_string()),
        cmd: Some(command.to_vec()),
        working_dir: Some(CONTAINER_WORKDIR.to_string()),
        host_config: Some(HostConfig {
            binds: Some(vec![format!(
                "{}:{}",
                staging.display(),
                CONTAINER_WORKDIR
            )]),
            ..Default::default()
        }),
        ..Default::default()
    };

    let container = client
        .create_container(None::<CreateContainerOptions>, body)
        .await?;
    let id = container.id;
    tracing::debug!("Created install container {}", id);

    let outcome = run_to_completion(&client, &id).await;

    let remove = RemoveContainerOptions {
        force: true,
        ..Default::default()
    };
    if let Err(e) = client.remove_container(&id, Some(remove)).await {
        tracing::warn!("Failed to remove install container {}: {}", id, e);
    }

    outcome
}

async fn ensure_image(client: &Docker, image: &str) -> Result<(), BuildError> {
    match client.inspect_image(image).await {
        Ok(_) => return Ok(()),
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => {}
        Err(e) => return Err(e.into()),
    }

    tracing::info!("Pulling {}", image);
    let opts = CreateImageOptions {
        from_image: Some(image.to_string()),
        ..Default::default()
    };

    // Pull returns a stream of progress updates - consume it
    let mut stream = client.create_image(Some(opts), None, None);
    while let Some(result) = stream.next().await {
        result.map_err(|e| BuildError::Container(format!("failed to pull {image}: {e}")))?;
    }

    Ok(())
}

async fn run_to_completion(client: &Docker, id: &str) -> Result<(), BuildError> {
    client
        .start_container(id, None::<bollard::query_parameters::StartContainerOptions>)
        .await?;

    let mut exit_code = 0;
    let mut wait = client.wait_container(id, None::<WaitContainerOptions>);
    while let Some(status) = wait.next().await {
        match status {
            Ok(response) => exit_code = response.status_code,
            Err(bollard::errors::Error::DockerContainerWaitError { code, .. }) => {
                exit_code = code;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if exit_code == 0 {
        return Ok(());
    }

    Err(BuildError::InstallFailed {
        exit_code: Some(exit_code),
        output: collect_logs(client, id).await,
    })
}

async fn collect_logs(client: &Docker, id: &str) -> String {
    let opts = LogsOptions {
        stdout: true,
        stderr: true,
        ..Default::default()
    };

    let mut output = String::new();
    let mut stream = client.logs(id, Some(opts));
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(line) => output.push_str(&line.to_string()),
            Err(e) => {
                tracing::debug!("Log stream for {} ended: {}", id, e);
                break;
            }
        }
    }
    output
}
