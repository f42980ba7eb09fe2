//! Stage step: copy the raw script and its virtual environment.

use std::fs;

use distkit_io_fs::{ReportMirror, SpecMirrorOptions, mirror_tree};

use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::package::copy_single_file;

/// Copy `tracker.py` and mirror the venv into `dist/python`.
pub fn stage(cfg: &BuildConfig, if_dry_run: bool) -> Result<ReportMirror> {
    if !if_dry_run {
        fs::create_dir_all(&cfg.dir_dist_python)
            .map_err(|e| BuildError::io(&cfg.dir_dist_python, e))?;
        copy_single_file(&cfg.path_script, &cfg.path_script_dest)?;
        tracing::info!("Copied {}", cfg.path_script_dest.display());
    }

    tracing::info!("Copying venv... (this may take a moment)");
    let spec_mirror_options = SpecMirrorOptions {
        if_dry_run,
        ..SpecMirrorOptions::excluding(cfg.names_exclude_venv.iter().cloned())
    };
    let report = mirror_tree(&cfg.dir_venv_source, &cfg.dir_venv_dest, &spec_mirror_options)?;
    tracing::info!("{}", report.format("Copied venv"));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use distkit_io_fs::MirrorTreeError;
    use tempfile::TempDir;

    fn write(path: &std::path::Path, txt: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, txt).expect("write");
    }

    #[test]
    fn stage_copies_script_and_venv_without_pycache() {
        let tmp = TempDir::new().expect("tempdir");
        let cfg = BuildConfig::from_project_root(tmp.path());
        write(&cfg.path_script, "print('hi')\n");
        write(&cfg.dir_venv_source.join("pyvenv.cfg"), "home = /usr/bin\n");
        write(&cfg.dir_venv_source.join("lib/site/mod.py"), "x = 1\n");
        write(&cfg.dir_venv_source.join("lib/site/__pycache__/mod.pyc"), "pyc");

        let report = stage(&cfg, false).expect("stage");

        assert_eq!(
            fs::read_to_string(&cfg.path_script_dest).expect("script"),
            "print('hi')\n"
        );
        assert!(cfg.dir_venv_dest.join("pyvenv.cfg").is_file());
        assert!(cfg.dir_venv_dest.join("lib/site/mod.py").is_file());
        assert!(!cfg.dir_venv_dest.join("lib/site/__pycache__").exists());
        assert_eq!(report.cnt_excluded, 1);
    }

    #[test]
    fn stage_honours_extra_excludes() {
        let tmp = TempDir::new().expect("tempdir");
        let cfg = BuildConfig::from_project_root(tmp.path()).with_extra_excludes([".mypy_cache"]);
        write(&cfg.path_script, "");
        write(&cfg.dir_venv_source.join(".mypy_cache/x.json"), "{}");
        write(&cfg.dir_venv_source.join("bin/activate"), "");

        stage(&cfg, false).expect("stage");
        assert!(cfg.dir_venv_dest.join("bin/activate").exists());
        assert!(!cfg.dir_venv_dest.join(".mypy_cache").exists());
    }

    #[test]
    fn stage_missing_script_is_io_error() {
        let tmp = TempDir::new().expect("tempdir");
        let cfg = BuildConfig::from_project_root(tmp.path());
        fs::create_dir_all(&cfg.dir_venv_source).expect("mkdir venv");

        let err = stage(&cfg, false).expect_err("must fail");
        assert!(matches!(err, BuildError::Io { .. }));
    }

    #[test]
    fn stage_missing_venv_is_source_not_found() {
        let tmp = TempDir::new().expect("tempdir");
        let cfg = BuildConfig::from_project_root(tmp.path());
        write(&cfg.path_script, "");

        let err = stage(&cfg, false).expect_err("must fail");
        assert!(matches!(
            err,
            BuildError::Mirror(MirrorTreeError::SourceNotFound(_))
        ));
        assert!(!cfg.dir_venv_dest.exists());
    }

    #[test]
    fn stage_dry_run_writes_nothing() {
        let tmp = TempDir::new().expect("tempdir");
        let cfg = BuildConfig::from_project_root(tmp.path());
        write(&cfg.path_script, "");
        write(&cfg.dir_venv_source.join("a.py"), "");

        let report = stage(&cfg, true).expect("stage");
        assert_eq!(report.cnt_skipped, 1);
        assert!(!cfg.dir_dist.exists());
    }
}
