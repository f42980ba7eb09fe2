use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{EnumMirrorPatternMode, MirrorTreeError};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

/// Compiled exclusion list.
#[derive(Debug, Clone)]
pub(crate) enum TypeExcludePatternSeq {
    Empty,
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl TypeExcludePatternSeq {
    pub(crate) fn compile(
        patterns: &[String],
        rule_pattern: EnumMirrorPatternMode,
    ) -> Result<Self, MirrorTreeError> {
        if patterns.is_empty() {
            return Ok(Self::Empty);
        }

        match rule_pattern {
            EnumMirrorPatternMode::Literal => Ok(Self::Literal(patterns.to_vec())),
            EnumMirrorPatternMode::Glob => {
                let mut l_glob = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let matcher = Glob::new(pattern)
                        .map_err(|e| _invalid_pattern(pattern, e.to_string()))?
                        .compile_matcher();
                    l_glob.push(matcher);
                }
                Ok(Self::Glob(l_glob))
            }
            EnumMirrorPatternMode::Regex => {
                let mut l_regex = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let regex =
                        Regex::new(pattern).map_err(|e| _invalid_pattern(pattern, e.to_string()))?;
                    l_regex.push(regex);
                }
                Ok(Self::Regex(l_regex))
            }
        }
    }

    /// Whether an entry base name is excluded.
    pub(crate) fn is_excluded(&self, name: &str) -> bool {
        match self {
            Self::Empty => false,
            Self::Literal(v) => v.iter().any(|p| p == name),
            Self::Glob(v) => v.iter().any(|p| p.is_match(name)),
            Self::Regex(v) => v.iter().any(|p| p.is_match(name)),
        }
    }
}

fn _invalid_pattern(pattern: &str, message: String) -> MirrorTreeError {
    MirrorTreeError::InvalidPattern {
        pattern: pattern.to_string(),
        message,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    // Destination usually does not exist yet: resolve the nearest existing
    // ancestor and re-attach the missing tail.
    let path_abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    let mut l_tail = Vec::new();
    let mut path_cursor = path_abs.as_path();
    while let Some(path_parent) = path_cursor.parent() {
        if let Some(name) = path_cursor.file_name() {
            l_tail.push(name.to_os_string());
        }
        if let Ok(resolved) = fs::canonicalize(path_parent) {
            return l_tail
                .iter()
                .rev()
                .fold(resolved, |acc, part| acc.join(part));
        }
        path_cursor = path_parent;
    }
    path_abs
}

/// Whether `dst` is `src` itself or lies inside it.
///
/// A source nested in the destination is fine: only `src` is walked.
pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = _normalize_path(src);
    let dst_resolved = _normalize_path(dst);
    dst_resolved.starts_with(&src_resolved)
}

/// Reject a destination entry that already exists as a symbolic link.
pub(crate) fn ensure_not_symlink(path_dst: &Path) -> Result<(), MirrorTreeError> {
    match fs::symlink_metadata(path_dst) {
        Ok(meta) if meta.file_type().is_symlink() => {
            Err(MirrorTreeError::UnsafeDestination(path_dst.to_path_buf()))
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MirrorTreeError::io(path_dst, e)),
    }
}

/// Create `path_dst` as a directory unless it already is one.
///
/// Returns `true` when a new directory was created.
pub(crate) fn ensure_directory(path_dst: &Path) -> Result<bool, MirrorTreeError> {
    ensure_not_symlink(path_dst)?;
    match fs::metadata(path_dst) {
        Ok(meta) if meta.is_dir() => Ok(false),
        Ok(_) => Err(MirrorTreeError::DestinationKindMismatch {
            path: path_dst.to_path_buf(),
            expected: "directory",
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(path_dst).map_err(|e| MirrorTreeError::io(path_dst, e))?;
            Ok(true)
        }
        Err(e) => Err(MirrorTreeError::io(path_dst, e)),
    }
}

/// Reject a destination file slot occupied by a directory.
pub(crate) fn ensure_file_slot(path_dst: &Path) -> Result<(), MirrorTreeError> {
    ensure_not_symlink(path_dst)?;
    if path_dst.is_dir() {
        return Err(MirrorTreeError::DestinationKindMismatch {
            path: path_dst.to_path_buf(),
            expected: "file",
        });
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CopyPrimitives

pub(crate) fn create_symbolic_link(path_src: &Path, path_dst: &Path) -> Result<(), io::Error> {
    let target = fs::read_link(path_src)?;
    if fs::symlink_metadata(path_dst).is_ok() {
        fs::remove_file(path_dst)?;
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, path_dst)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if path_src.is_dir() {
            symlink_dir(&target, path_dst)
        } else {
            symlink_file(&target, path_dst)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = target;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

/// Byte-exact copy, optionally followed by metadata transfer.
pub(crate) fn copy_file(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_preserve_metadata: bool,
) -> Result<(), io::Error> {
    fs::copy(path_file_src, path_file_dst)?;
    if if_preserve_metadata {
        apply_metadata(path_file_src, path_file_dst)?;
    }
    Ok(())
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

// Best effort: filesystems without xattr support are common (tmpfs, FAT).
#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            tracing::debug!(
                "xattr {:?} not copied to {}: {e}",
                name,
                path_file_dst.display()
            );
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
