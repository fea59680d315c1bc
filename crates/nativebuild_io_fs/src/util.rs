use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::report::ReportCopyBuilder;
use crate::spec::CopyTreeError;

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

/// Compiled exclusion rules for one copy run.
#[derive(Debug, Clone)]
pub(crate) struct SpecCopyPatterns {
    set_globs: GlobSet,
    /// Destination path relative to the source root, when the destination
    /// is nested inside the source.
    path_rel_dst_nested: Option<String>,
}

impl SpecCopyPatterns {
    pub(crate) fn from_raw(
        patterns_exclude: &[String],
        path_rel_dst_nested: Option<String>,
    ) -> Result<Self, CopyTreeError> {
        let mut builder_globs = GlobSetBuilder::new();
        for pattern in patterns_exclude {
            let pattern_norm = _normalize_pattern(pattern);
            if pattern_norm.is_empty() {
                continue;
            }
            let glob = GlobBuilder::new(&pattern_norm)
                .literal_separator(true)
                .build()
                .map_err(|e| CopyTreeError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
            builder_globs.add(glob);
        }
        let set_globs = builder_globs
            .build()
            .map_err(|e| CopyTreeError::InvalidPattern {
                pattern: patterns_exclude.join(", "),
                message: e.to_string(),
            })?;

        Ok(Self {
            set_globs,
            path_rel_dst_nested,
        })
    }

    /// `true` when `path_rel` (slash-separated) must be left out of the copy.
    pub(crate) fn is_excluded(&self, path_rel: &str) -> bool {
        if self
            .path_rel_dst_nested
            .as_deref()
            .is_some_and(|p| p == path_rel)
        {
            return true;
        }
        self.set_globs.is_match(path_rel)
    }
}

/// Strip `./` prefixes and trailing separators so `node_modules/` and
/// `./node_modules` behave like `node_modules`.
fn _normalize_pattern(pattern: &str) -> String {
    let mut pattern_norm = pattern.trim().replace('\\', "/");
    while let Some(rest) = pattern_norm.strip_prefix("./") {
        pattern_norm = rest.to_string();
    }
    while pattern_norm.len() > 1 && pattern_norm.ends_with('/') {
        pattern_norm.pop();
    }
    pattern_norm
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Path of `path` relative to `path_root`, joined with `/` on every platform.
pub(crate) fn derive_relative_path(path: &Path, path_root: &Path) -> Option<String> {
    let path_rel = path.strip_prefix(path_root).ok()?;
    let l_parts = path_rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>();
    Some(l_parts.join("/"))
}

fn _absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// Canonicalize the deepest existing ancestor and re-append the missing tail.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let path_abs = _absolutize_path(path);
    let mut l_tail = Vec::new();
    let mut path_cursor = path_abs.as_path();
    loop {
        if let Ok(resolved) = fs::canonicalize(path_cursor) {
            let mut path_norm = resolved;
            for part in l_tail.iter().rev() {
                path_norm.push(part);
            }
            return path_norm;
        }
        match (path_cursor.parent(), path_cursor.file_name()) {
            (Some(parent), Some(name)) => {
                l_tail.push(name.to_os_string());
                path_cursor = parent;
            }
            _ => return path_abs,
        }
    }
}

/// Relative location of `path_dst` inside `path_src`, if nested.
pub(crate) fn derive_nested_destination(path_src: &Path, path_dst: &Path) -> Option<String> {
    let path_src_norm = normalize_path(path_src);
    let path_dst_norm = normalize_path(path_dst);
    if path_src_norm == path_dst_norm {
        return None;
    }
    derive_relative_path(&path_dst_norm, &path_src_norm).filter(|p| !p.is_empty())
}

/// `true` when wiping `path_dst` would also wipe `path_src`.
pub(crate) fn is_source_inside_destination(path_src: &Path, path_dst: &Path) -> bool {
    normalize_path(path_src).starts_with(normalize_path(path_dst))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileCopy

/// Copy file bytes, optionally carrying permissions, timestamps and xattrs.
///
/// Returns the number of bytes copied.
pub(crate) fn copy_file(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_preserve_metadata: bool,
    builder_cp_report: &mut ReportCopyBuilder,
) -> Result<u64, io::Error> {
    let n_bytes = fs::copy(path_file_src, path_file_dst)?;
    if if_preserve_metadata {
        apply_metadata(path_file_src, path_file_dst, builder_cp_report)?;
    }
    Ok(n_bytes)
}

fn apply_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    builder_cp_report: &mut ReportCopyBuilder,
) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    {
        for warning in copy_xattrs_linux(path_file_src, path_file_dst) {
            builder_cp_report.add_warning(warning);
        }
    }
    #[cfg(not(target_os = "linux"))]
    let _ = builder_cp_report;
    Ok(())
}

/// Copy extended attributes; returns one message per attribute that could
/// not be carried over. Filesystems without xattr support yield none.
#[cfg(target_os = "linux")]
pub(crate) fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) -> Vec<String> {
    let mut l_warnings = Vec::new();
    let iter_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::Unsupported => return l_warnings,
        Err(e) => {
            l_warnings.push(format!(
                "Extended attributes unreadable: {}: {e}",
                path_file_src.display()
            ));
            return l_warnings;
        }
    };

    for name in iter_names {
        let c_name = name.to_string_lossy();
        let res_copy = match xattr::get(path_file_src, &name) {
            Ok(Some(raw_value)) => xattr::set(path_file_dst, &name, &raw_value),
            Ok(None) => continue,
            Err(e) => Err(e),
        };
        if let Err(e) = res_copy {
            l_warnings.push(format!(
                "Extended attribute `{c_name}` not copied to {}: {e}",
                path_file_dst.display()
            ));
        }
    }
    l_warnings
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{SpecCopyPatterns, _normalize_pattern, derive_relative_path};

    fn compile(patterns: &[&str]) -> SpecCopyPatterns {
        let l_patterns = patterns.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        SpecCopyPatterns::from_raw(&l_patterns, None).expect("compile patterns")
    }

    #[test]
    fn star_does_not_cross_separator() {
        let spec_pats = compile(&["cache/*"]);
        assert!(spec_pats.is_excluded("cache/x.tmp"));
        assert!(!spec_pats.is_excluded("cache"));
        assert!(!spec_pats.is_excluded("cache/sub/x.tmp"));
        assert!(!spec_pats.is_excluded("app/cache/x.tmp"));
    }

    #[test]
    fn nested_segment_pattern_matches_one_level() {
        let spec_pats = compile(&["*/tests"]);
        assert!(spec_pats.is_excluded("app/tests"));
        assert!(!spec_pats.is_excluded("tests"));
        assert!(!spec_pats.is_excluded("a/b/tests"));
    }

    #[test]
    fn double_star_crosses_separators() {
        let spec_pats = compile(&["**/*.log"]);
        assert!(spec_pats.is_excluded("storage/logs/laravel.log"));
        assert!(spec_pats.is_excluded("x.log"));
    }

    #[test]
    fn trailing_slash_and_dot_prefix_are_ignored() {
        assert_eq!(_normalize_pattern("./node_modules/"), "node_modules");
        let spec_pats = compile(&["node_modules/", "  "]);
        assert!(spec_pats.is_excluded("node_modules"));
    }

    #[test]
    fn nested_destination_is_always_excluded() {
        let spec_pats =
            SpecCopyPatterns::from_raw(&[], Some("build/app".to_string())).expect("compile");
        assert!(spec_pats.is_excluded("build/app"));
        assert!(!spec_pats.is_excluded("build"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn xattr_copy_failure_is_reported() {
        use tempfile::TempDir;

        use super::copy_xattrs_linux;

        let tmp = TempDir::new().expect("tempdir");
        let path_src = tmp.path().join("src.txt");
        std::fs::write(&path_src, "a").expect("write");
        if xattr::set(&path_src, "user.origin", b"app").is_err() {
            return;
        }

        let l_warnings = copy_xattrs_linux(&path_src, &tmp.path().join("missing/dst.txt"));
        assert_eq!(l_warnings.len(), 1);
        assert!(l_warnings[0].contains("user.origin"));

        let path_dst = tmp.path().join("dst.txt");
        std::fs::write(&path_dst, "a").expect("write");
        assert!(copy_xattrs_linux(&path_src, &path_dst).is_empty());
        assert_eq!(
            xattr::get(&path_dst, "user.origin").expect("get").as_deref(),
            Some(&b"app"[..])
        );
    }

    #[test]
    fn relative_path_uses_forward_slashes() {
        let path_root = Path::new("root");
        let path = path_root.join("a").join("b.txt");
        assert_eq!(
            derive_relative_path(&path, path_root).as_deref(),
            Some("a/b.txt")
        );
        assert_eq!(derive_relative_path(path_root, path_root).as_deref(), Some(""));
    }
}
