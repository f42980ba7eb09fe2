//! End-to-end runs of the build pipeline

use std::fs;
use std::path::Path;
use std::process::Command;

use distkit_build::{
    BuildConfig, BuildError, EnumBuildStep, SpecPackagerCommand, SpecRunOptions, run,
};
use tempfile::TempDir;

fn write(path: &Path, txt: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, txt).expect("write");
}

/// Project with a script and a small venv.
fn scaffold_project(root: &Path) {
    write(&root.join("tracker.py"), "print('tracking')\n");
    write(&root.join("venv/pyvenv.cfg"), "home = /usr/bin\n");
    write(&root.join("venv/lib/python3.12/site-packages/cv2/__init__.py"), "");
    write(
        &root.join("venv/lib/python3.12/site-packages/cv2/__pycache__/__init__.pyc"),
        "pyc",
    );
}

#[cfg(unix)]
fn sh(script: &str) -> SpecPackagerCommand {
    SpecPackagerCommand {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
    }
}

#[cfg(unix)]
#[test]
fn all_steps_produce_distribution_layout() {
    let tmp = TempDir::new().expect("tempdir");
    scaffold_project(tmp.path());
    let cfg = BuildConfig::from_project_root(tmp.path());
    let script = format!("printf exe > dist/{}", cfg.name_executable);
    let cfg = cfg.with_packager(sh(&script));

    run(&cfg, EnumBuildStep::All, SpecRunOptions::default()).expect("run");

    let dir_out = tmp.path().join("dist/python");
    assert_eq!(fs::read(dir_out.join(&cfg.name_executable)).expect("exe"), b"exe");
    assert!(dir_out.join("tracker.py").is_file());
    assert!(
        dir_out
            .join("venv/lib/python3.12/site-packages/cv2/__init__.py")
            .is_file()
    );
    assert!(
        !dir_out
            .join("venv/lib/python3.12/site-packages/cv2/__pycache__")
            .exists()
    );
}

#[cfg(unix)]
#[test]
fn packager_failure_stops_before_any_copy() {
    let tmp = TempDir::new().expect("tempdir");
    scaffold_project(tmp.path());
    let cfg = BuildConfig::from_project_root(tmp.path()).with_packager(sh("exit 1"));

    let err = run(&cfg, EnumBuildStep::All, SpecRunOptions::default()).expect_err("must fail");
    assert!(matches!(err, BuildError::PackagerFailed { .. }));
    assert!(!cfg.path_artifact_dest.exists());
    assert!(!cfg.path_script_dest.exists());
    assert!(!cfg.dir_venv_dest.exists());
}

#[cfg(unix)]
#[test]
fn packager_success_without_artifact_is_reported_distinctly() {
    let tmp = TempDir::new().expect("tempdir");
    scaffold_project(tmp.path());
    let cfg = BuildConfig::from_project_root(tmp.path()).with_packager(sh("exit 0"));

    let err = run(&cfg, EnumBuildStep::Freeze, SpecRunOptions::default()).expect_err("must fail");
    assert!(matches!(err, BuildError::ArtifactMissing { .. }));
    assert!(err.to_string().contains("Artifact not found"));
    assert!(!cfg.path_artifact_dest.exists());
}

#[test]
fn stage_twice_yields_same_tree() {
    let tmp = TempDir::new().expect("tempdir");
    scaffold_project(tmp.path());
    let cfg = BuildConfig::from_project_root(tmp.path());

    let report_first = distkit_build::stage::stage(&cfg, false).expect("first");
    let report_second = distkit_build::stage::stage(&cfg, false).expect("second");
    assert_eq!(report_first.cnt_copied, report_second.cnt_copied);
    assert_eq!(report_second.cnt_dirs_created, 0);
    assert_eq!(
        fs::read_to_string(cfg.dir_venv_dest.join("pyvenv.cfg")).expect("cfg"),
        "home = /usr/bin\n"
    );
}

#[test]
fn cli_stage_exits_zero_on_success() {
    let tmp = TempDir::new().expect("tempdir");
    scaffold_project(tmp.path());

    let output = Command::new(env!("CARGO_BIN_EXE_distkit"))
        .arg("-C")
        .arg(tmp.path())
        .args(["stage", "--exclude", "site-packages"])
        .output()
        .expect("run distkit");

    assert!(output.status.success(), "{output:?}");
    let dir_venv = tmp.path().join("dist/python/venv");
    assert!(dir_venv.join("pyvenv.cfg").is_file());
    assert!(!dir_venv.join("lib/python3.12/site-packages").exists());
}

#[test]
fn cli_stage_exits_one_when_venv_is_missing() {
    let tmp = TempDir::new().expect("tempdir");
    write(&tmp.path().join("tracker.py"), "");

    let output = Command::new(env!("CARGO_BIN_EXE_distkit"))
        .arg("-C")
        .arg(tmp.path())
        .arg("stage")
        .env("RUST_LOG", "info")
        .output()
        .expect("run distkit");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Source directory not found"), "{stderr}");
    assert!(!stderr.contains('\x1b'), "colour codes in piped stderr: {stderr:?}");
}

#[test]
fn cli_all_rejects_dry_run() {
    let tmp = TempDir::new().expect("tempdir");
    scaffold_project(tmp.path());

    let output = Command::new(env!("CARGO_BIN_EXE_distkit"))
        .arg("-C")
        .arg(tmp.path())
        .args(["all", "--dry-run"])
        .output()
        .expect("run distkit");

    assert_eq!(output.status.code(), Some(2));
    assert!(!tmp.path().join("dist").exists());
}

#[test]
fn cli_freeze_exits_one_without_a_working_packager() {
    // No tracker.spec in an empty project: pyinstaller is either absent or fails.
    let tmp = TempDir::new().expect("tempdir");

    let status = Command::new(env!("CARGO_BIN_EXE_distkit"))
        .arg("-C")
        .arg(tmp.path())
        .arg("freeze")
        .status()
        .expect("run distkit");

    assert_eq!(status.code(), Some(1));
    assert!(!tmp.path().join("dist/python/tracker").exists());
}
