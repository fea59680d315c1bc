//! Filesystem tree traversal and copy orchestration.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::keep::write_placeholder_files;
use crate::report::{ReportCopy, ReportCopyBuilder};
use crate::spec::{CopyTreeError, SpecCopyOptions};
use crate::util::{
    SpecCopyPatterns, copy_file, derive_nested_destination, derive_relative_path,
    is_source_inside_destination,
};

#[derive(Debug)]
struct SpecCopyContext {
    path_dir_src: PathBuf,
    path_dir_dst: PathBuf,
    spec_cp_pats: SpecCopyPatterns,
    if_preserve_metadata: bool,
    builder_cp_report: ReportCopyBuilder,
    /// Device/inode of every directory on the current walk path.
    set_ancestor_dirs: HashSet<(u64, u64)>,
}

/// Stage `dir_source` into a freshly recreated `dir_destination`.
///
/// The run:
/// 1. validates inputs and compiles the exclusion globs,
/// 2. deletes `dir_destination` and creates it empty,
/// 3. walks the source pre-order, following symlinks, and drops every entry
///    (with its subtree) whose source-relative path matches a pattern,
/// 4. creates the remaining directories and copies the remaining files,
/// 5. writes the keep-alive placeholders.
///
/// When the destination is nested inside the source it is excluded from the
/// walk automatically. A source nested inside the destination is rejected
/// before anything is deleted.
///
/// The first IO failure aborts the run and leaves the destination partially
/// populated.
pub fn copy_filtered_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_cp_options: SpecCopyOptions,
) -> Result<ReportCopy, CopyTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = dir_source.as_ref().to_path_buf();
    let path_dir_dst = dir_destination.as_ref().to_path_buf();

    if !path_dir_src.is_dir() {
        return Err(CopyTreeError::SourceNotDirectory(path_dir_src));
    }
    if is_source_inside_destination(&path_dir_src, &path_dir_dst) {
        return Err(CopyTreeError::SourceDestinationOverlap {
            source_dir: path_dir_src,
            destination: path_dir_dst,
        });
    }

    let path_rel_dst_nested = derive_nested_destination(&path_dir_src, &path_dir_dst);
    let spec_cp_pats =
        SpecCopyPatterns::from_raw(&spec_cp_options.patterns_exclude, path_rel_dst_nested)?;

    reset_destination(&path_dir_dst)?;

    let mut spec_cp_ctx = SpecCopyContext {
        path_dir_src: path_dir_src.clone(),
        path_dir_dst,
        spec_cp_pats,
        if_preserve_metadata: spec_cp_options.if_preserve_metadata,
        builder_cp_report: ReportCopyBuilder::default(),
        set_ancestor_dirs: HashSet::new(),
    };

    walk_directory(&path_dir_src, &mut spec_cp_ctx)?;

    if spec_cp_options.if_write_placeholders {
        let n_placeholders = write_placeholder_files(&spec_cp_ctx.path_dir_dst)
            .map_err(|e| CopyTreeError::io(&spec_cp_ctx.path_dir_dst, e))?;
        spec_cp_ctx
            .builder_cp_report
            .add_placeholders(n_placeholders);
    }

    Ok(spec_cp_ctx.builder_cp_report.build())
}

/// Remove whatever sits at `path_dir_dst` and create an empty directory.
fn reset_destination(path_dir_dst: &Path) -> Result<(), CopyTreeError> {
    let init_err = |e| CopyTreeError::DestinationInit {
        path: path_dir_dst.to_path_buf(),
        source: e,
    };

    match fs::symlink_metadata(path_dir_dst) {
        Ok(meta_dst) if meta_dst.file_type().is_dir() => {
            fs::remove_dir_all(path_dir_dst).map_err(init_err)?;
        }
        Ok(_) => fs::remove_file(path_dir_dst).map_err(init_err)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(init_err(e)),
    }
    fs::create_dir_all(path_dir_dst).map_err(init_err)
}

/// Device/inode identity of `path_dir`, following symlinks.
#[cfg(unix)]
fn derive_dir_key(path_dir: &Path) -> Result<Option<(u64, u64)>, CopyTreeError> {
    use std::os::unix::fs::MetadataExt;

    let stat_dir = fs::metadata(path_dir).map_err(|e| CopyTreeError::io(path_dir, e))?;
    Ok(Some((stat_dir.dev(), stat_dir.ino())))
}

#[cfg(not(unix))]
fn derive_dir_key(_path_dir: &Path) -> Result<Option<(u64, u64)>, CopyTreeError> {
    Ok(None)
}

/// Walk `path_dir` unless it is already one of its own ancestors.
///
/// Only the current chain counts as a loop: a directory reached again through
/// a sibling link is copied once per path.
fn walk_directory(path_dir: &Path, spec_cp_ctx: &mut SpecCopyContext) -> Result<(), CopyTreeError> {
    let key_dir = derive_dir_key(path_dir)?;
    if let Some(key) = key_dir {
        if !spec_cp_ctx.set_ancestor_dirs.insert(key) {
            spec_cp_ctx
                .builder_cp_report
                .add_warning(format!("Symlink loop detected: {}", path_dir.display()));
            return Ok(());
        }
    }

    let res_walk = walk_entries(path_dir, spec_cp_ctx);

    if let Some(key) = key_dir {
        spec_cp_ctx.set_ancestor_dirs.remove(&key);
    }
    res_walk
}

fn walk_entries(path_dir: &Path, spec_cp_ctx: &mut SpecCopyContext) -> Result<(), CopyTreeError> {
    let iter_entries = fs::read_dir(path_dir).map_err(|e| CopyTreeError::io(path_dir, e))?;
    let mut l_paths_entry = Vec::new();
    for entry_res in iter_entries {
        let entry = entry_res.map_err(|e| CopyTreeError::io(path_dir, e))?;
        l_paths_entry.push(entry.path());
    }
    l_paths_entry.sort();

    for path_entry in l_paths_entry {
        handle_entry(&path_entry, spec_cp_ctx)?;
    }
    Ok(())
}

fn handle_entry(path_entry: &Path, spec_cp_ctx: &mut SpecCopyContext) -> Result<(), CopyTreeError> {
    spec_cp_ctx.builder_cp_report.add_scanned();

    let Some(path_rel) = derive_relative_path(path_entry, &spec_cp_ctx.path_dir_src) else {
        return Ok(());
    };
    if spec_cp_ctx.spec_cp_pats.is_excluded(&path_rel) {
        log::debug!("Excluded: {path_rel}");
        spec_cp_ctx.builder_cp_report.add_excluded();
        return Ok(());
    }

    // `metadata` follows symlinks, so linked directories are walked too.
    let meta_src = fs::metadata(path_entry).map_err(|e| CopyTreeError::io(path_entry, e))?;
    let path_dst = match path_entry.strip_prefix(&spec_cp_ctx.path_dir_src) {
        Ok(v) => spec_cp_ctx.path_dir_dst.join(v),
        Err(_) => spec_cp_ctx.path_dir_dst.join(&path_rel),
    };

    if meta_src.is_dir() {
        if !path_dst.is_dir() {
            fs::create_dir_all(&path_dst).map_err(|e| CopyTreeError::io(&path_dst, e))?;
            spec_cp_ctx.builder_cp_report.add_dir_created();
        }
        return walk_directory(path_entry, spec_cp_ctx);
    }

    if meta_src.is_file() {
        let n_bytes = copy_file(
            path_entry,
            &path_dst,
            spec_cp_ctx.if_preserve_metadata,
            &mut spec_cp_ctx.builder_cp_report,
        )
        .map_err(|e| CopyTreeError::io(path_entry, e))?;
        spec_cp_ctx.builder_cp_report.add_file_copied(n_bytes);
        return Ok(());
    }

    spec_cp_ctx
        .builder_cp_report
        .add_warning(format!("Special file skipped: {}", path_entry.display()));
    Ok(())
}
