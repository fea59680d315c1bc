use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::process::{ProcessRunner, SpecProcess, echo_line};
use crate::spec::{BuildError, BuildResult};

/// Directories removed from the Build Tree after the production install.
pub const L_VENDOR_PRUNE_DIRS: [&str; 2] = ["vendor/bin", "vendor/nativephp/php-bin"];

/// Reinstall Composer packages without dev dependencies, then drop
/// executables the bundle never needs.
pub fn prune_vendor_directory(
    runner: &dyn ProcessRunner,
    path_build: &Path,
    envs: &BTreeMap<String, String>,
) -> BuildResult<()> {
    let spec_process =
        SpecProcess::new("composer", ["install", "--no-dev"], path_build).with_envs(envs.clone());
    runner.run(&spec_process, &mut echo_line)?;

    for c_dir in L_VENDOR_PRUNE_DIRS {
        let path_dir = path_build.join(c_dir);
        match fs::remove_dir_all(&path_dir) {
            Ok(()) => log::debug!("Removed {}", path_dir.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(BuildError::io(path_dir, e)),
        }
    }
    Ok(())
}
