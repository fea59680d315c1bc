use std::fs;
use std::path::Path;

use crate::spec::{BuildError, BuildResult};

/// Icon sources under the app root and their destinations under the
/// Electron project.
pub const L_ICON_TARGETS: [(&str, &[&str]); 3] = [
    ("public/icon.png", &["resources/icon.png", "build/icon.png"]),
    ("public/IconTemplate.png", &["resources/IconTemplate.png"]),
    ("public/IconTemplate@2x.png", &["resources/IconTemplate@2x.png"]),
];

/// Copy the app's icons into the Electron project. Missing icons are skipped.
///
/// Returns the number of files written.
pub fn install_icons(path_app_root: &Path, path_electron: &Path) -> BuildResult<usize> {
    let mut cnt_written = 0;
    for (c_src, l_dst) in L_ICON_TARGETS {
        let path_src = path_app_root.join(c_src);
        if !path_src.is_file() {
            log::debug!("Icon {c_src} not found, skipping");
            continue;
        }
        for c_dst in l_dst {
            let path_dst = path_electron.join(c_dst);
            if let Some(parent) = path_dst.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
            }
            fs::copy(&path_src, &path_dst).map_err(|e| BuildError::io(&path_src, e))?;
            cnt_written += 1;
        }
    }
    if cnt_written == 0 {
        log::warn!("No app icon found in {}", path_app_root.join("public").display());
    }
    Ok(cnt_written)
}
