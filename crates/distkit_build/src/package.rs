//! Freeze step: run the external packager and collect its single artifact.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::BuildConfig;
use crate::error::{BuildError, Result};

/// Create the output directories. Existing directories are left alone.
pub fn create_directories(cfg: &BuildConfig) -> Result<()> {
    for dir in cfg.directories() {
        fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
    }
    Ok(())
}

/// Run the packager in the project root with inherited stdio.
pub fn run_packager(cfg: &BuildConfig) -> Result<()> {
    let command = cfg.packager.display();
    tracing::info!("Running packager: {command}");

    let status = Command::new(&cfg.packager.program)
        .args(&cfg.packager.args)
        .current_dir(&cfg.dir_project)
        .status()
        .map_err(|source| BuildError::PackagerSpawn {
            command: command.clone(),
            source,
        })?;

    if !status.success() {
        return Err(BuildError::PackagerFailed { command, status });
    }
    tracing::debug!("Packager finished with {status}");
    Ok(())
}

/// Copy the packager artifact to its distribution path.
///
/// The artifact is copied rather than moved so a later rebuild starts from the
/// same state.
pub fn collect_artifact(cfg: &BuildConfig) -> Result<PathBuf> {
    if !cfg.path_artifact.is_file() {
        return Err(BuildError::ArtifactMissing {
            path: cfg.path_artifact.clone(),
        });
    }

    if let Some(dir_parent) = cfg.path_artifact_dest.parent() {
        fs::create_dir_all(dir_parent).map_err(|e| BuildError::io(dir_parent, e))?;
    }
    copy_single_file(&cfg.path_artifact, &cfg.path_artifact_dest)?;
    Ok(cfg.path_artifact_dest.clone())
}

pub(crate) fn copy_single_file(path_src: &Path, path_dst: &Path) -> Result<()> {
    fs::copy(path_src, path_dst).map_err(|e| BuildError::io(path_src, e))?;
    Ok(())
}

/// Full freeze step: directories, packager, artifact.
pub fn freeze(cfg: &BuildConfig) -> Result<PathBuf> {
    tracing::info!("Building Python executable...");
    create_directories(cfg)?;
    run_packager(cfg)?;
    let path_exe = collect_artifact(cfg)?;
    tracing::info!("Python executable built at {}", path_exe.display());
    Ok(path_exe)
}
