// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup, descriptor fixtures and source-tree helpers.

use bytes::Bytes;
use lambdeploy::deploy::DeploymentDescriptor;
use lambdeploy::types::{FunctionName, Region, RuntimeId};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Once};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("lambdeploy=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[allow(dead_code)]
pub fn region(name: &str) -> Region {
    Region::new(name).unwrap()
}

/// Descriptor for a small function carrying `artifact` as its code.
#[allow(dead_code)]
pub fn descriptor(name: &str, artifact: &'static [u8]) -> Arc<DeploymentDescriptor> {
    Arc::new(DeploymentDescriptor {
        function_name: FunctionName::new(name).unwrap(),
        runtime: RuntimeId::new("nodejs20.x").unwrap(),
        handler: "index.handler".to_string(),
        memory_size: 256,
        timeout_secs: 10,
        role: "arn:aws:iam::123456789012:role/test".to_string(),
        description: String::new(),
        vpc: None,
        dead_letter_target: None,
        tracing: None,
        environment: BTreeMap::from([("STAGE".to_string(), "test".to_string())]),
        artifact: Bytes::from_static(artifact),
        publish: false,
    })
}

/// Write each `(relative path, contents)` pair under `root`.
#[allow(dead_code)]
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (relative, contents) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
}

/// Create an executable script at `root/relative`.
#[allow(dead_code)]
#[cfg(unix)]
pub fn write_script(root: &Path, relative: &str, script: &str) {
    use std::os::unix::fs::PermissionsExt;

    let path = root.join(relative);
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
}

/// Names of every entry in a zip archive, sorted.
#[allow(dead_code)]
pub fn archive_entries(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}
