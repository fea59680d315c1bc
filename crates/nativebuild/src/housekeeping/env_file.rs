use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;

use crate::spec::{BuildError, BuildResult};

static RE_ENV_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:export\s+)?([A-Za-z_][A-Za-z0-9_.]*)\s*=").expect("valid env key regex")
});

fn compile_key_patterns(env_keys: &[String]) -> BuildResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in env_keys {
        let glob = Glob::new(pattern.trim()).map_err(|e| {
            BuildError::Config(format!("Invalid cleanup env key `{pattern}`: {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| BuildError::Config(format!("Invalid cleanup env keys: {e}")))
}

/// `.env` contents without comment lines and without assignments whose key
/// matches one of `env_keys` (`*` wildcards allowed).
pub fn derive_cleaned_env(txt: &str, env_keys: &[String]) -> BuildResult<String> {
    let set_keys = compile_key_patterns(env_keys)?;

    let l_kept: Vec<&str> = txt
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter(|line| match RE_ENV_KEY.captures(line) {
            Some(caps) => !set_keys.is_match(&caps[1]),
            None => true,
        })
        .collect();

    let mut out = l_kept.join("\n");
    if !out.is_empty() && txt.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Scrub `<path_build>/.env` in place. A missing file only logs a warning.
pub fn clean_env_file(path_build: &Path, env_keys: &[String]) -> BuildResult<()> {
    let path_env = path_build.join(".env");
    let txt = match fs::read_to_string(&path_env) {
        Ok(txt) => txt,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::warn!("No .env file in {}, skipping cleanup", path_build.display());
            return Ok(());
        }
        Err(e) => return Err(BuildError::io(path_env, e)),
    };

    let cleaned = derive_cleaned_env(&txt, env_keys)?;
    let cnt_removed = txt.lines().count() - cleaned.lines().count();
    fs::write(&path_env, cleaned).map_err(|e| BuildError::io(&path_env, e))?;
    log::debug!("Removed {cnt_removed} line(s) from {}", path_env.display());
    Ok(())
}
