//! Directory tree traversal and mirror orchestration.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::report::{ReportMirror, ReportMirrorBuilder};
use crate::spec::{EnumMirrorSymlinkStrategy, MirrorTreeError, SpecMirrorOptions};
use crate::util::{
    TypeExcludePatternSeq, copy_file, create_symbolic_link, ensure_directory, ensure_file_slot,
    ensure_not_symlink, is_overlap,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumEntryKind {
    Directory,
    File,
    Symlink,
    Special,
}

#[derive(Debug)]
struct SpecDirEntry {
    path_src: PathBuf,
    name: OsString,
    kind: EnumEntryKind,
}

struct SpecMirrorContext<'a> {
    spec_mirror_options: &'a SpecMirrorOptions,
    spec_exclude_pats: TypeExcludePatternSeq,
    builder_report: ReportMirrorBuilder,
    /// `(dev, ino)` of the directories currently being walked.
    l_ancestor_ids: Vec<(u64, u64)>,
}

/// Mirror the directory tree at `dir_source` into `dir_destination`.
///
/// The destination root and any missing parents are created. Entries whose
/// base name matches [`SpecMirrorOptions::names_exclude`] are skipped at every
/// depth, without descending. Regular files are copied byte for byte and
/// overwrite whatever file already sits at the destination.
///
/// This function performs:
/// 1. Pattern compilation and source/destination validation. Nothing is
///    written when one of these checks fails.
/// 2. A sequential depth-first walk, directories before files, each level
///    sorted by name.
///
/// The first failing entry aborts the run with [`MirrorTreeError`]. Files
/// written up to that point are left in place.
pub fn mirror_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_mirror_options: &SpecMirrorOptions,
) -> Result<ReportMirror, MirrorTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = dir_source.as_ref().to_path_buf();
    let path_dir_dst = dir_destination.as_ref().to_path_buf();

    let spec_exclude_pats = TypeExcludePatternSeq::compile(
        &spec_mirror_options.names_exclude,
        spec_mirror_options.rule_pattern,
    )?;

    let meta_dir_src = match fs::metadata(&path_dir_src) {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(MirrorTreeError::SourceNotFound(path_dir_src));
        }
        Err(e) => return Err(MirrorTreeError::io(path_dir_src, e)),
    };
    if !meta_dir_src.is_dir() {
        return Err(MirrorTreeError::SourceNotDirectory(path_dir_src));
    }
    if is_overlap(&path_dir_src, &path_dir_dst) {
        return Err(MirrorTreeError::SourceDestinationOverlap {
            source_dir: path_dir_src,
            destination_dir: path_dir_dst,
        });
    }

    let mut spec_mirror_ctx = SpecMirrorContext {
        spec_mirror_options,
        spec_exclude_pats,
        builder_report: ReportMirrorBuilder::default(),
        l_ancestor_ids: Vec::new(),
    };

    if !spec_mirror_options.if_dry_run {
        init_destination_root(&path_dir_dst, &mut spec_mirror_ctx.builder_report)?;
    }

    tracing::debug!(
        "Mirroring {} -> {}",
        path_dir_src.display(),
        path_dir_dst.display()
    );
    if let Some(id_dir) = dir_identity(&meta_dir_src) {
        spec_mirror_ctx.l_ancestor_ids.push(id_dir);
    }
    walk_directory(&path_dir_src, &path_dir_dst, &mut spec_mirror_ctx)?;
    Ok(spec_mirror_ctx.builder_report.build())
}

fn init_destination_root(
    path_dir_dst: &Path,
    builder_report: &mut ReportMirrorBuilder,
) -> Result<(), MirrorTreeError> {
    let init_failed = |message: String| MirrorTreeError::DestinationInitFailed {
        path: path_dir_dst.to_path_buf(),
        message,
    };

    match fs::symlink_metadata(path_dir_dst) {
        Ok(meta) if meta.file_type().is_symlink() => Err(init_failed(
            "Destination root path must not be a symbolic link.".to_string(),
        )),
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(init_failed(
            "Destination root exists and is not a directory.".to_string(),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(path_dir_dst).map_err(|e| init_failed(e.to_string()))?;
            builder_report.add_dir_created();
            Ok(())
        }
        Err(e) => Err(init_failed(e.to_string())),
    }
}

#[cfg(unix)]
fn dir_identity(meta: &fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn dir_identity(_meta: &fs::Metadata) -> Option<(u64, u64)> {
    None
}

fn read_entries(path_dir_src: &Path) -> Result<Vec<SpecDirEntry>, MirrorTreeError> {
    let iter_entries =
        fs::read_dir(path_dir_src).map_err(|e| MirrorTreeError::io(path_dir_src, e))?;

    let mut l_entries = Vec::new();
    for entry_res in iter_entries {
        let entry = entry_res.map_err(|e| MirrorTreeError::io(path_dir_src, e))?;
        let path_src = entry.path();
        let cfg_file_type = entry
            .file_type()
            .map_err(|e| MirrorTreeError::io(&path_src, e))?;

        let kind = if cfg_file_type.is_symlink() {
            EnumEntryKind::Symlink
        } else if cfg_file_type.is_dir() {
            EnumEntryKind::Directory
        } else if cfg_file_type.is_file() {
            EnumEntryKind::File
        } else {
            EnumEntryKind::Special
        };
        l_entries.push(SpecDirEntry {
            path_src,
            name: entry.file_name(),
            kind,
        });
    }

    l_entries.sort_by(|a, b| {
        let rank_a = a.kind == EnumEntryKind::Directory;
        let rank_b = b.kind == EnumEntryKind::Directory;
        rank_b.cmp(&rank_a).then_with(|| a.name.cmp(&b.name))
    });
    Ok(l_entries)
}

fn walk_directory(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    spec_mirror_ctx: &mut SpecMirrorContext<'_>,
) -> Result<(), MirrorTreeError> {
    for spec_entry in read_entries(path_dir_src)? {
        spec_mirror_ctx.builder_report.add_scanned();

        let c_name = spec_entry.name.to_string_lossy();
        if spec_mirror_ctx.spec_exclude_pats.is_excluded(&c_name) {
            tracing::debug!("Excluded: {}", spec_entry.path_src.display());
            spec_mirror_ctx.builder_report.add_excluded();
            continue;
        }

        let path_dst = path_dir_dst.join(&spec_entry.name);
        match spec_entry.kind {
            EnumEntryKind::Directory => {
                let meta_src = fs::metadata(&spec_entry.path_src)
                    .map_err(|e| MirrorTreeError::io(&spec_entry.path_src, e))?;
                descend(&spec_entry.path_src, &meta_src, &path_dst, spec_mirror_ctx)?;
            }
            EnumEntryKind::File => {
                handle_file(&spec_entry.path_src, &path_dst, spec_mirror_ctx)?;
            }
            EnumEntryKind::Symlink => {
                handle_symlink(&spec_entry.path_src, &path_dst, spec_mirror_ctx)?;
            }
            EnumEntryKind::Special => {
                spec_mirror_ctx.builder_report.add_warning(format!(
                    "Special file skipped: {}",
                    spec_entry.path_src.display()
                ));
                spec_mirror_ctx.builder_report.add_skipped();
            }
        }
    }
    Ok(())
}

fn descend(
    path_dir_src: &Path,
    meta_dir_src: &fs::Metadata,
    path_dir_dst: &Path,
    spec_mirror_ctx: &mut SpecMirrorContext<'_>,
) -> Result<(), MirrorTreeError> {
    let id_dir = dir_identity(meta_dir_src);
    if let Some(id_dir) = id_dir
        && spec_mirror_ctx.l_ancestor_ids.contains(&id_dir)
    {
        spec_mirror_ctx
            .builder_report
            .add_warning(format!("Symlink loop detected: {}", path_dir_src.display()));
        spec_mirror_ctx.builder_report.add_skipped();
        return Ok(());
    }

    if !spec_mirror_ctx.spec_mirror_options.if_dry_run && ensure_directory(path_dir_dst)? {
        tracing::debug!("Created directory {}", path_dir_dst.display());
        spec_mirror_ctx.builder_report.add_dir_created();
    }

    if let Some(id_dir) = id_dir {
        spec_mirror_ctx.l_ancestor_ids.push(id_dir);
    }
    let res_walk = walk_directory(path_dir_src, path_dir_dst, spec_mirror_ctx);
    if id_dir.is_some() {
        spec_mirror_ctx.l_ancestor_ids.pop();
    }
    res_walk
}

fn handle_file(
    path_file_src: &Path,
    path_file_dst: &Path,
    spec_mirror_ctx: &mut SpecMirrorContext<'_>,
) -> Result<(), MirrorTreeError> {
    if spec_mirror_ctx.spec_mirror_options.if_dry_run {
        spec_mirror_ctx.builder_report.add_skipped();
        return Ok(());
    }

    ensure_file_slot(path_file_dst)?;
    copy_file(
        path_file_src,
        path_file_dst,
        spec_mirror_ctx.spec_mirror_options.if_preserve_metadata,
    )
    .map_err(|e| MirrorTreeError::io(path_file_src, e))?;
    tracing::debug!("Copied {}", path_file_dst.display());
    spec_mirror_ctx.builder_report.add_copied();
    Ok(())
}

fn handle_symlink(
    path_src: &Path,
    path_dst: &Path,
    spec_mirror_ctx: &mut SpecMirrorContext<'_>,
) -> Result<(), MirrorTreeError> {
    match spec_mirror_ctx.spec_mirror_options.rule_symlink {
        EnumMirrorSymlinkStrategy::SkipSymlinks => {
            spec_mirror_ctx
                .builder_report
                .add_warning(format!("Symlink skipped: {}", path_src.display()));
            spec_mirror_ctx.builder_report.add_skipped();
            Ok(())
        }
        EnumMirrorSymlinkStrategy::CopySymlinks => {
            if spec_mirror_ctx.spec_mirror_options.if_dry_run {
                spec_mirror_ctx.builder_report.add_skipped();
                return Ok(());
            }
            if path_dst.is_dir() && !path_dst.is_symlink() {
                return Err(MirrorTreeError::DestinationKindMismatch {
                    path: path_dst.to_path_buf(),
                    expected: "file",
                });
            }
            create_symbolic_link(path_src, path_dst)
                .map_err(|e| MirrorTreeError::io(path_dst, e))?;
            tracing::debug!("Linked {}", path_dst.display());
            spec_mirror_ctx.builder_report.add_copied();
            Ok(())
        }
        EnumMirrorSymlinkStrategy::Dereference => {
            // A broken link surfaces here as NotFound.
            let meta_target =
                fs::metadata(path_src).map_err(|e| MirrorTreeError::io(path_src, e))?;
            if meta_target.is_dir() {
                ensure_not_symlink(path_dst)?;
                descend(path_src, &meta_target, path_dst, spec_mirror_ctx)
            } else if meta_target.is_file() {
                handle_file(path_src, path_dst, spec_mirror_ctx)
            } else {
                spec_mirror_ctx.builder_report.add_warning(format!(
                    "Special file target skipped: {}",
                    path_src.display()
                ));
                spec_mirror_ctx.builder_report.add_skipped();
                Ok(())
            }
        }
    }
}
