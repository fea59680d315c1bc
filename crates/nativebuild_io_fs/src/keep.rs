//! Keep-alive placeholders for directories the Electron packager would prune.

use std::fs;
use std::io;
use std::path::Path;

/// Placeholder locations relative to the build root.
///
/// Dotfiles get pruned too, so these are plain `.json` files.
pub const L_PLACEHOLDER_FILES: [&str; 6] = [
    "storage/framework/cache/_native.json",
    "storage/framework/sessions/_native.json",
    "storage/framework/testing/_native.json",
    "storage/framework/views/_native.json",
    "storage/app/public/_native.json",
    "storage/logs/_native.json",
];

/// Content of every placeholder file.
pub const C_PLACEHOLDER_CONTENT: &str = "{}";

/// Write all placeholders under `path_dir_dst`, creating missing parents.
///
/// Existing files at those paths are overwritten. Returns the number of
/// files written.
pub fn write_placeholder_files(path_dir_dst: &Path) -> io::Result<usize> {
    for path_rel in L_PLACEHOLDER_FILES {
        let path_file = path_dir_dst.join(path_rel);
        if let Some(path_parent) = path_file.parent() {
            fs::create_dir_all(path_parent)?;
        }
        fs::write(&path_file, C_PLACEHOLDER_CONTENT)?;
    }
    Ok(L_PLACEHOLDER_FILES.len())
}
