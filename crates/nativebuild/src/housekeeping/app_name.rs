use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::spec::{BuildError, BuildResult};
use crate::util::slugify;

/// Rewrite `name` in the Electron `package.json`, keeping every other key and
/// the key order.
pub fn set_app_name(path_package_json: &Path, name: &str, if_slugify: bool) -> BuildResult<()> {
    let txt = fs::read_to_string(path_package_json)
        .map_err(|e| BuildError::io(path_package_json, e))?;
    let json_err = |e| BuildError::Json {
        path: path_package_json.to_path_buf(),
        source: e,
    };

    let mut doc: Value = serde_json::from_str(&txt).map_err(json_err)?;
    let Some(obj) = doc.as_object_mut() else {
        return Err(BuildError::Config(format!(
            "{} is not a JSON object",
            path_package_json.display()
        )));
    };

    let c_name = if if_slugify {
        slugify(name)?
    } else {
        name.to_string()
    };
    log::debug!("Setting package name to `{c_name}`");
    obj.insert("name".to_string(), Value::String(c_name));

    let mut out = serde_json::to_string_pretty(&doc).map_err(json_err)?;
    out.push('\n');
    fs::write(path_package_json, out).map_err(|e| BuildError::io(path_package_json, e))
}
