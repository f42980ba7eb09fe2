//! Mirror specification models and top-level error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Symlink handling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumMirrorSymlinkStrategy {
    /// Follow the link and copy the target bytes/entries.
    Dereference,
    /// Create a symbolic link at destination (do not copy target bytes).
    CopySymlinks,
    /// Ignore symlink entries and record a warning.
    SkipSymlinks,
}

/// Pattern matching mode for the exclusion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumMirrorPatternMode {
    /// Exact base-name equality.
    Literal,
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `mirror_tree`.
#[derive(Debug, Clone)]
pub struct SpecMirrorOptions {
    /// Entry base names (files and directories) skipped at any depth.
    pub names_exclude: Vec<String>,
    /// Interpretation of `names_exclude`.
    pub rule_pattern: EnumMirrorPatternMode,
    /// Symlink handling behavior.
    pub rule_symlink: EnumMirrorSymlinkStrategy,
    /// Copy permissions, timestamps and extended attributes after each file.
    pub if_preserve_metadata: bool,
    /// Do not mutate filesystem; record what would happen.
    pub if_dry_run: bool,
}

impl Default for SpecMirrorOptions {
    fn default() -> Self {
        Self {
            names_exclude: Vec::new(),
            rule_pattern: EnumMirrorPatternMode::Literal,
            rule_symlink: EnumMirrorSymlinkStrategy::SkipSymlinks,
            if_preserve_metadata: true,
            if_dry_run: false,
        }
    }
}

impl SpecMirrorOptions {
    /// Literal exclusion of the given base names, other options at default.
    pub fn excluding<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names_exclude: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Failures that abort a `mirror_tree` run.
///
/// Setup variants are raised before anything is written. `Io`,
/// `UnsafeDestination` and `DestinationKindMismatch` can occur mid-walk and
/// leave the destination partially populated.
#[derive(Debug, Error)]
pub enum MirrorTreeError {
    /// Invalid exclusion pattern.
    #[error("Invalid exclude pattern `{pattern}`: {message}")]
    InvalidPattern {
        /// Offending pattern text.
        pattern: String,
        /// Compiler error text.
        message: String,
    },
    /// Source path does not exist.
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    /// Source path exists but is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Destination is the source itself or lies inside it.
    #[error(
        "Source and destination directories overlap: {} <-> {}",
        source_dir.display(),
        destination_dir.display()
    )]
    SourceDestinationOverlap {
        /// Normalized source directory.
        source_dir: PathBuf,
        /// Normalized destination directory.
        destination_dir: PathBuf,
    },
    /// Destination root could not be prepared.
    #[error("Failed to initialize destination {}: {message}", path.display())]
    DestinationInitFailed {
        /// Destination path that failed initialization.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// Destination entry would be written through a symbolic link.
    #[error("Refusing to write through destination symlink: {}", .0.display())]
    UnsafeDestination(PathBuf),
    /// Destination entry exists with the wrong kind (file vs directory).
    #[error("Destination {} exists but is not a {expected}", path.display())]
    DestinationKindMismatch {
        /// Conflicting destination path.
        path: PathBuf,
        /// `"file"` or `"directory"`.
        expected: &'static str,
    },
    /// Filesystem failure on one entry.
    #[error("I/O failure at {}: {source}", path.display())]
    Io {
        /// Source or destination path being processed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl MirrorTreeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
