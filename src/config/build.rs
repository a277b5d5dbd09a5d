// ABOUTME: Artifact build settings from the `build` section of lambdeploy.yml.
// ABOUTME: Source directory, exclude globs, shortcuts and the dependency-install policy.

use crate::build::InstallPolicy;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Extra globs excluded on top of the built-in ones.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Already-built directory to archive as-is (no install, no hook).
    #[serde(default)]
    pub prebuilt_dir: Option<PathBuf>,

    /// Precomputed archive shipped unchanged when the file exists.
    #[serde(default)]
    pub archive: Option<PathBuf>,

    /// Run the dependency install inside this container image.
    #[serde(default)]
    pub docker_image: Option<String>,

    #[serde(default = "default_install_command")]
    pub install_command: Vec<String>,

    #[serde(default)]
    pub skip_install: bool,

    /// Where `package` writes the archive.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            exclude: Vec::new(),
            prebuilt_dir: None,
            archive: None,
            docker_image: None,
            install_command: default_install_command(),
            skip_install: false,
            output_dir: default_output_dir(),
        }
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_install_command() -> Vec<String> {
    ["npm", "install", "--production"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build")
}

impl BuildConfig {
    pub fn install_policy(&self) -> InstallPolicy {
        if self.skip_install {
            return InstallPolicy::Skip;
        }

        match &self.docker_image {
            Some(image) => InstallPolicy::Container {
                image: image.clone(),
                command: self.install_command.clone(),
            },
            None => InstallPolicy::Host {
                command: self.install_command.clone(),
            },
        }
    }
}
