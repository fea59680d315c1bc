use std::sync::LazyLock;

use deunicode::deunicode;
use regex::Regex;

use crate::spec::{BuildError, BuildResult};

static RE_SLUG_DROP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid slug regex"));
static RE_SLUG_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]+").expect("valid separator regex"));

/// URL/file-name friendly form of `value`: `"Bob's Café_App"` -> `bobs-cafe-app`.
///
/// Non-ASCII text is transliterated first. A name with nothing left to slug
/// is a configuration error.
pub(crate) fn slugify(value: &str) -> BuildResult<String> {
    let lower = deunicode(value).to_lowercase().replace('_', " ");
    let kept = RE_SLUG_DROP.replace_all(&lower, "");
    let joined = RE_SLUG_SEPARATOR.replace_all(kept.trim(), "-");
    let slug = joined.trim_matches('-').to_string();
    if slug.is_empty() {
        return Err(BuildError::Config(format!(
            "App name `{value}` has no characters usable in a file name"
        )));
    }
    Ok(slug)
}
