// ABOUTME: Integration tests for the artifact builder.
// ABOUTME: Covers exclusion, shortcuts, host install, the post-install hook and failures.

mod support;

use lambdeploy::build::{ArtifactSource, BuildError, BuildRequest, InstallPolicy, build};
use lambdeploy::config::Config;
use lambdeploy::diagnostics::{Diagnostics, WarningKind};
use std::fs;
use std::path::Path;
use support::{archive_entries, init_tracing, write_script, write_tree};
use tempfile::TempDir;

fn sh(script: &str) -> InstallPolicy {
    InstallPolicy::Host {
        command: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
    }
}

fn request(source: &Path, install: InstallPolicy) -> BuildRequest {
    BuildRequest {
        source_dir: source.to_path_buf(),
        exclude: Vec::new(),
        install,
        function: "api".to_string(),
        environment: "staging".to_string(),
        prebuilt_dir: None,
        archive: None,
    }
}

fn sample_project(root: &Path) {
    write_tree(
        root,
        &[
            ("package.json", "{}"),
            ("index.js", "exports.handler = async () => 1;"),
            ("lib/util.js", "module.exports = {};"),
            (".git/HEAD", "ref: refs/heads/main"),
            (".gitignore", "node_modules"),
            ("build/api.zip", "old"),
            (".lambda/cache", "old"),
            ("debug.log", "noise"),
            (".env", "SECRET=1"),
            ("deploy.env", "SECRET=2"),
            ("notes.txt~", "backup"),
        ],
    );
}

/// Test: built-in excludes drop VCS metadata, build output and local files.
#[tokio::test]
async fn archive_contains_only_shippable_files() {
    init_tracing();
    let source = TempDir::new().unwrap();
    sample_project(source.path());

    let mut diag = Diagnostics::default();
    let artifact = build(&request(source.path(), InstallPolicy::Skip), &mut diag)
        .await
        .unwrap();

    assert_eq!(artifact.source, ArtifactSource::Built);
    assert_eq!(
        archive_entries(&artifact.bytes),
        ["index.js", "lib/util.js", "package.json"]
    );
    assert_eq!(artifact.file_count, 3);
}

/// Test: caller globs add to the built-in list but never drop the root manifest.
#[tokio::test]
async fn manifest_survives_caller_excludes() {
    let source = TempDir::new().unwrap();
    write_tree(
        source.path(),
        &[
            ("package.json", "{}"),
            ("index.js", ""),
            ("fixtures/data.json", "[]"),
            ("README.md", "# api"),
        ],
    );

    let mut req = request(source.path(), InstallPolicy::Skip);
    req.exclude = vec!["*.json *.md".to_string()];

    let artifact = build(&req, &mut Diagnostics::default()).await.unwrap();

    assert_eq!(archive_entries(&artifact.bytes), ["index.js", "package.json"]);
}

/// Test: install runs inside the staged copy, never in the source tree.
#[tokio::test]
async fn host_install_output_is_archived() {
    let source = TempDir::new().unwrap();
    write_tree(source.path(), &[("package.json", "{}"), ("index.js", "")]);

    let install = sh("mkdir -p node_modules/dep && echo dep > node_modules/dep/index.js");
    let artifact = build(&request(source.path(), install), &mut Diagnostics::default())
        .await
        .unwrap();

    assert!(archive_entries(&artifact.bytes).contains(&"node_modules/dep/index.js".to_string()));
    assert!(!source.path().join("node_modules").exists());
}

/// Test: a failing install aborts the build with its exit code and output.
#[tokio::test]
async fn failing_install_aborts_the_build() {
    let source = TempDir::new().unwrap();
    write_tree(source.path(), &[("package.json", "{}")]);

    let err = build(
        &request(source.path(), sh("echo registry unreachable >&2; exit 3")),
        &mut Diagnostics::default(),
    )
    .await
    .unwrap_err();

    match err {
        BuildError::InstallFailed { exit_code, output } => {
            assert_eq!(exit_code, Some(3));
            assert!(output.contains("registry unreachable"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Test: prebuilt directories skip install and only ship what they contain.
#[tokio::test]
async fn prebuilt_directory_skips_install() {
    let source = TempDir::new().unwrap();
    let prebuilt = TempDir::new().unwrap();
    write_tree(source.path(), &[("package.json", "{}")]);
    write_tree(prebuilt.path(), &[("index.js", ""), ("vendor/lib.js", "")]);

    let mut req = request(source.path(), sh("exit 1"));
    req.prebuilt_dir = Some(prebuilt.path().to_path_buf());

    let artifact = build(&req, &mut Diagnostics::default()).await.unwrap();

    assert_eq!(
        artifact.source,
        ArtifactSource::Prebuilt(prebuilt.path().to_path_buf())
    );
    assert_eq!(archive_entries(&artifact.bytes), ["index.js", "vendor/lib.js"]);
}

/// Test: a manifest physically present in the prebuilt directory is kept.
#[tokio::test]
async fn prebuilt_manifest_is_kept_when_present() {
    let source = TempDir::new().unwrap();
    let prebuilt = TempDir::new().unwrap();
    write_tree(prebuilt.path(), &[("index.js", ""), ("package.json", "{}")]);

    let mut req = request(source.path(), InstallPolicy::Skip);
    req.prebuilt_dir = Some(prebuilt.path().to_path_buf());

    let artifact = build(&req, &mut Diagnostics::default()).await.unwrap();

    assert_eq!(archive_entries(&artifact.bytes), ["index.js", "package.json"]);
}

/// Test: an existing precomputed archive is returned byte for byte.
#[tokio::test]
async fn precomputed_archive_is_shipped_unchanged() {
    let source = TempDir::new().unwrap();
    let archive = source.path().join("prebuilt.zip");
    fs::write(&archive, b"opaque archive bytes").unwrap();

    let mut req = request(source.path(), sh("exit 1"));
    req.archive = Some(archive.clone());

    let artifact = build(&req, &mut Diagnostics::default()).await.unwrap();

    assert_eq!(&artifact.bytes[..], b"opaque archive bytes");
    assert_eq!(artifact.source, ArtifactSource::Precomputed(archive));
}

/// Test: a missing precomputed archive falls back to a normal build.
#[tokio::test]
async fn missing_precomputed_archive_builds_normally() {
    let source = TempDir::new().unwrap();
    write_tree(source.path(), &[("index.js", "")]);

    let mut req = request(source.path(), InstallPolicy::Skip);
    req.archive = Some(source.path().join("absent.zip"));

    let artifact = build(&req, &mut Diagnostics::default()).await.unwrap();

    assert_eq!(artifact.source, ArtifactSource::Built);
    assert_eq!(archive_entries(&artifact.bytes), ["index.js"]);
}

/// Test: the hook receives the environment name and its output is archived.
#[tokio::test]
async fn post_install_hook_runs_with_environment() {
    let source = TempDir::new().unwrap();
    write_tree(source.path(), &[("index.js", "")]);
    write_script(
        source.path(),
        "post_install.sh",
        "#!/bin/sh\necho \"$1:$LAMBDEPLOY_FUNCTION\" > hook.txt\n",
    );

    let artifact = build(&request(source.path(), InstallPolicy::Skip), &mut Diagnostics::default())
        .await
        .unwrap();

    let entries = archive_entries(&artifact.bytes);
    assert!(entries.contains(&"hook.txt".to_string()));

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(&artifact.bytes[..])).unwrap();
    let mut contents = String::new();
    std::io::Read::read_to_string(&mut archive.by_name("hook.txt").unwrap(), &mut contents)
        .unwrap();
    assert_eq!(contents.trim(), "staging:api");
}

/// Test: a failing hook aborts the build with its output attached.
#[tokio::test]
async fn failing_hook_aborts_the_build() {
    let source = TempDir::new().unwrap();
    write_tree(source.path(), &[("index.js", "")]);
    write_script(
        source.path(),
        "post_install.sh",
        "#!/bin/sh\necho hook exploded >&2\nexit 7\n",
    );

    let err = build(&request(source.path(), InstallPolicy::Skip), &mut Diagnostics::default())
        .await
        .unwrap_err();

    match err {
        BuildError::PostInstallHook { exit_code, output } => {
            assert_eq!(exit_code, Some(7));
            assert!(output.contains("hook exploded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Test: a hook that is not executable is skipped with a warning.
#[tokio::test]
async fn non_executable_hook_is_skipped_with_warning() {
    let source = TempDir::new().unwrap();
    write_tree(
        source.path(),
        &[("index.js", ""), ("post_install.sh", "#!/bin/sh\nexit 1\n")],
    );

    let mut diag = Diagnostics::default();
    build(&request(source.path(), InstallPolicy::Skip), &mut diag)
        .await
        .unwrap();

    assert!(
        diag.warnings()
            .iter()
            .any(|w| w.kind == WarningKind::HookSkipped)
    );
}

/// Test: a missing source directory is reported before anything runs.
#[tokio::test]
async fn missing_source_directory_is_an_error() {
    let err = build(
        &request(Path::new("/nonexistent/lambdeploy-source"), InstallPolicy::Skip),
        &mut Diagnostics::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, BuildError::SourceMissing(_)));
}

/// Test: a configured output directory inside the source tree never ships.
#[tokio::test]
async fn configured_output_dir_is_excluded() {
    let source = TempDir::new().unwrap();
    write_tree(
        source.path(),
        &[
            ("index.js", ""),
            ("dist/api.zip", "previous package"),
            ("lib/dist/keep.js", ""),
        ],
    );

    let config = Config::from_yaml(
        r#"
function:
  name: api
  runtime: nodejs20.x
  role: arn:aws:iam::123456789012:role/api
build:
  output_dir: dist
  skip_install: true
deploy:
  regions: [us-east-1]
"#,
    )
    .unwrap();

    let artifact = build(
        &config.build_request(source.path()),
        &mut Diagnostics::default(),
    )
    .await
    .unwrap();

    assert_eq!(
        archive_entries(&artifact.bytes),
        ["index.js", "lib/dist/keep.js"]
    );
}

/// Test: installs that link packages into node_modules are archived.
#[tokio::test]
async fn linked_install_output_is_archived() {
    let source = TempDir::new().unwrap();
    write_tree(source.path(), &[("package.json", "{}"), ("index.js", "")]);

    let install = sh("mkdir -p node_modules/.pnpm/left-pad/node_modules/left-pad \
         && echo pad > node_modules/.pnpm/left-pad/node_modules/left-pad/index.js \
         && ln -s .pnpm/left-pad/node_modules/left-pad node_modules/left-pad");
    let artifact = build(&request(source.path(), install), &mut Diagnostics::default())
        .await
        .unwrap();

    let entries = archive_entries(&artifact.bytes);
    assert!(entries.contains(&"node_modules/left-pad/index.js".to_string()));
    assert!(entries.contains(&"node_modules/.pnpm/left-pad/node_modules/left-pad/index.js".to_string()));
}
