//! Run configuration: every path and command a build step touches.
//!
//! A [`BuildConfig`] is derived once from the project root and handed to each
//! step by reference.

use std::path::{Path, PathBuf};

/// Script frozen and staged by the distribution steps.
pub const C_NAME_SCRIPT: &str = "tracker.py";
/// Base name of the frozen executable.
pub const C_NAME_EXECUTABLE_STEM: &str = "tracker";
/// Packager spec file passed to PyInstaller.
pub const C_NAME_PACKAGER_SPEC: &str = "tracker.spec";
/// Directory names never copied out of the virtual environment.
pub const TUP_NAMES_EXCLUDE_VENV: [&str; 1] = ["__pycache__"];

/// External packaging command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecPackagerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for SpecPackagerCommand {
    fn default() -> Self {
        Self {
            program: "pyinstaller".to_string(),
            args: vec![
                "--clean".to_string(),
                "--noconfirm".to_string(),
                C_NAME_PACKAGER_SPEC.to_string(),
            ],
        }
    }
}

impl SpecPackagerCommand {
    /// Human-readable command line for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Paths and commands for one run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root; working directory of the packager.
    pub dir_project: PathBuf,
    pub dir_dist: PathBuf,
    pub dir_build: PathBuf,
    pub dir_dist_python: PathBuf,
    pub dir_dist_electron: PathBuf,
    /// File name of the frozen executable, platform suffix included.
    pub name_executable: String,
    /// Where the packager is expected to leave its artifact.
    pub path_artifact: PathBuf,
    /// Where the artifact is copied to.
    pub path_artifact_dest: PathBuf,
    pub packager: SpecPackagerCommand,
    pub path_script: PathBuf,
    pub path_script_dest: PathBuf,
    pub dir_venv_source: PathBuf,
    pub dir_venv_dest: PathBuf,
    pub names_exclude_venv: Vec<String>,
}

impl BuildConfig {
    /// Default layout rooted at `dir_project`.
    pub fn from_project_root(dir_project: impl AsRef<Path>) -> Self {
        let dir_project = dir_project.as_ref().to_path_buf();
        let dir_dist = dir_project.join("dist");
        let dir_dist_python = dir_dist.join("python");
        let name_executable = format!(
            "{C_NAME_EXECUTABLE_STEM}{}",
            std::env::consts::EXE_SUFFIX
        );

        Self {
            dir_build: dir_project.join("build"),
            dir_dist_electron: dir_dist.join("electron"),
            path_artifact: dir_dist.join(&name_executable),
            path_artifact_dest: dir_dist_python.join(&name_executable),
            packager: SpecPackagerCommand::default(),
            path_script: dir_project.join(C_NAME_SCRIPT),
            path_script_dest: dir_dist_python.join(C_NAME_SCRIPT),
            dir_venv_source: dir_project.join("venv"),
            dir_venv_dest: dir_dist_python.join("venv"),
            names_exclude_venv: TUP_NAMES_EXCLUDE_VENV
                .iter()
                .map(|s| s.to_string())
                .collect(),
            name_executable,
            dir_dist,
            dir_dist_python,
            dir_project,
        }
    }

    /// Replace the packaging command.
    pub fn with_packager(mut self, packager: SpecPackagerCommand) -> Self {
        self.packager = packager;
        self
    }

    /// Add venv exclusion names on top of the defaults; duplicates are dropped.
    pub fn with_extra_excludes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.names_exclude_venv.contains(&name) {
                self.names_exclude_venv.push(name);
            }
        }
        self
    }

    /// Output directories prepared before packaging.
    pub fn directories(&self) -> [&Path; 4] {
        [
            &self.dir_dist,
            &self.dir_build,
            &self.dir_dist_python,
            &self.dir_dist_electron,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_rooted_at_project() {
        let cfg = BuildConfig::from_project_root("/proj");
        let exe = format!("tracker{}", std::env::consts::EXE_SUFFIX);

        assert_eq!(cfg.name_executable, exe);
        assert_eq!(cfg.path_artifact, Path::new("/proj/dist").join(&exe));
        assert_eq!(cfg.path_artifact_dest, Path::new("/proj/dist/python").join(&exe));
        assert_eq!(cfg.path_script, Path::new("/proj/tracker.py"));
        assert_eq!(cfg.path_script_dest, Path::new("/proj/dist/python/tracker.py"));
        assert_eq!(cfg.dir_venv_source, Path::new("/proj/venv"));
        assert_eq!(cfg.dir_venv_dest, Path::new("/proj/dist/python/venv"));
        assert_eq!(
            cfg.directories(),
            [
                Path::new("/proj/dist"),
                Path::new("/proj/build"),
                Path::new("/proj/dist/python"),
                Path::new("/proj/dist/electron"),
            ]
        );
    }

    #[test]
    fn default_packager_is_pyinstaller_spec_build() {
        let cfg = BuildConfig::from_project_root("/proj");
        assert_eq!(
            cfg.packager.display(),
            "pyinstaller --clean --noconfirm tracker.spec"
        );
    }

    #[test]
    fn extra_excludes_extend_defaults_without_duplicates() {
        let cfg = BuildConfig::from_project_root("/proj")
            .with_extra_excludes(["__pycache__", ".mypy_cache", ".mypy_cache"]);
        assert_eq!(cfg.names_exclude_venv, vec!["__pycache__", ".mypy_cache"]);
    }
}
