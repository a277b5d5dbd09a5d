// ABOUTME: Post-install hook discovered at the root of the staged build directory.
// ABOUTME: Runs the script with the target environment name and captures its output.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Script name looked up at the staging root.
pub const POST_INSTALL_HOOK: &str = "post_install.sh";

/// Context passed to the hook.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Target environment name; passed as the only argument.
    pub environment: String,
    pub function: String,
}

impl HookContext {
    /// Convert context to environment variables.
    pub fn to_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert(
            "LAMBDEPLOY_ENVIRONMENT".to_string(),
            self.environment.clone(),
        );
        env.insert("LAMBDEPLOY_FUNCTION".to_string(), self.function.clone());
        env
    }
}

/// Result of running a hook.
#[derive(Debug)]
pub struct HookResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl HookResult {
    /// Stdout and stderr joined for error reports.
    pub fn combined_output(&self) -> String {
        match (self.stdout.trim(), self.stderr.trim()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }
}

/// Finds and runs the post-install hook in a build directory.
pub struct HookRunner {
    hook_path: PathBuf,
}

impl HookRunner {
    /// Create a runner looking for the hook at the root of `build_dir`.
    pub fn new(build_dir: &Path) -> Self {
        Self {
            hook_path: build_dir.join(POST_INSTALL_HOOK),
        }
    }

    /// Whether an executable hook is present.
    pub fn hook_exists(&self) -> bool {
        is_executable(&self.hook_path)
    }

    /// Run the hook if it exists.
    ///
    /// Returns None if there is no executable hook, or Some(HookResult) if it was run.
    pub async fn run(&self, context: &HookContext) -> Option<HookResult> {
        if !self.hook_path.is_file() {
            return None;
        }

        if !self.hook_exists() {
            tracing::warn!(
                "{} is not executable, skipping post-install hook",
                self.hook_path.display()
            );
            return None;
        }

        tracing::info!("Running post-install hook: {}", self.hook_path.display());

        let working_dir = self.hook_path.parent().unwrap_or(Path::new("."));
        let output = Command::new(&self.hook_path)
            .arg(&context.environment)
            .envs(context.to_env())
            .current_dir(working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) => {
                let result = HookResult {
                    success: output.status.success(),
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if result.success {
                    tracing::info!("post-install hook completed successfully");
                } else {
                    tracing::warn!(
                        "post-install hook failed with exit code {:?}",
                        result.exit_code
                    );
                }

                Some(result)
            }
            Err(e) => {
                tracing::error!("Failed to execute post-install hook: {}", e);
                Some(HookResult {
                    success: false,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: e.to_string(),
                })
            }
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
