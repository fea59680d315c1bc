//! Environment passed to every packager invocation.

use std::collections::BTreeMap;
use std::path::Path;

use crate::conf::SpecBuildConfig;
use crate::spec::{BuildError, BuildResult};
use crate::updater::Updater;
use crate::util::slugify;

fn path_to_env(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Assemble the packager environment from `config` and `updater`.
///
/// Updater credentials are merged last and win on key collisions.
pub fn derive_build_environment(
    config: &SpecBuildConfig,
    updater: &Updater<'_>,
) -> BuildResult<BTreeMap<String, String>> {
    let c_updater_config =
        serde_json::to_string(&updater.builder_options()).map_err(|e| BuildError::Json {
            path: config.path_app_root.clone(),
            source: e,
        })?;

    let spec_app = &config.app;
    let mut dict_env = BTreeMap::from([
        ("APP_PATH".to_string(), path_to_env(&config.path_app_root)),
        ("APP_URL".to_string(), spec_app.url.clone()),
        ("NATIVEPHP_BUILDING".to_string(), "1".to_string()),
        (
            "NATIVEPHP_PHP_BINARY_VERSION".to_string(),
            config.paths.runtime_version.clone(),
        ),
        (
            "NATIVEPHP_PHP_BINARY_PATH".to_string(),
            path_to_env(&config.path_runtime_binary()),
        ),
        (
            "NATIVEPHP_CERTIFICATE_FILE_PATH".to_string(),
            path_to_env(&config.path_certificate()),
        ),
        ("NATIVEPHP_APP_NAME".to_string(), spec_app.name.clone()),
        ("NATIVEPHP_APP_ID".to_string(), spec_app.id.clone()),
        ("NATIVEPHP_APP_VERSION".to_string(), spec_app.version.clone()),
        ("NATIVEPHP_APP_FILENAME".to_string(), slugify(&spec_app.name)?),
        ("NATIVEPHP_APP_AUTHOR".to_string(), spec_app.author.clone()),
        ("NATIVEPHP_UPDATER_CONFIG".to_string(), c_updater_config),
        (
            "NATIVEPHP_DEEPLINK_SCHEME".to_string(),
            spec_app.deeplink_scheme.clone(),
        ),
    ]);
    dict_env.extend(updater.environment_variables());

    log::trace!("Build environment keys: {:?}", dict_env.keys().collect::<Vec<_>>());
    Ok(dict_env)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use std::collections::BTreeMap;

    use super::derive_build_environment;
    use crate::conf::SpecBuildConfig;
    use crate::spec::{BuildError, BuildResult};
    use crate::updater::Updater;

    fn config(txt: &str) -> SpecBuildConfig {
        SpecBuildConfig::from_toml_str(txt, PathBuf::from("/srv/app")).expect("config")
    }

    fn derive(config: &SpecBuildConfig) -> BuildResult<BTreeMap<String, String>> {
        derive_build_environment(config, &Updater::new(&config.updater))
    }

    #[test]
    fn environment_carries_fixed_keys() {
        let config = config(
            "[app]\nname = \"Demo App\"\nid = \"com.example.demo\"\nversion = \"2.0.0\"\nauthor = \"Acme\"\ndeeplink_scheme = \"demo\"\n",
        );
        let dict_env = derive(&config).expect("env");

        assert_eq!(dict_env["APP_PATH"], "/srv/app");
        assert_eq!(dict_env["APP_URL"], "http://localhost");
        assert_eq!(dict_env["NATIVEPHP_BUILDING"], "1");
        assert_eq!(dict_env["NATIVEPHP_PHP_BINARY_VERSION"], "8.3");
        assert_eq!(
            dict_env["NATIVEPHP_PHP_BINARY_PATH"],
            "/srv/app/vendor/nativephp/php-bin/bin/"
        );
        assert_eq!(
            dict_env["NATIVEPHP_CERTIFICATE_FILE_PATH"],
            "/srv/app/vendor/nativephp/php-bin/cacert.pem"
        );
        assert_eq!(dict_env["NATIVEPHP_APP_NAME"], "Demo App");
        assert_eq!(dict_env["NATIVEPHP_APP_FILENAME"], "demo-app");
        assert_eq!(dict_env["NATIVEPHP_APP_AUTHOR"], "Acme");
        assert_eq!(dict_env["NATIVEPHP_UPDATER_CONFIG"], "{}");
        assert_eq!(dict_env["NATIVEPHP_DEEPLINK_SCHEME"], "demo");
        assert_eq!(dict_env.len(), 13);
    }

    #[test]
    fn updater_variables_are_merged() {
        let config = config(
            "[app]\nname = \"Demo\"\nid = \"x\"\nversion = \"1\"\n\n[updater]\nenabled = true\n\n[updater.providers.github]\nrepo = \"demo\"\nowner = \"acme\"\ntoken = \"ghp\"\n",
        );
        let dict_env = derive(&config).expect("env");

        assert_eq!(dict_env["GH_TOKEN"], "ghp");
        let updater_config: serde_json::Value =
            serde_json::from_str(&dict_env["NATIVEPHP_UPDATER_CONFIG"]).expect("json");
        assert_eq!(updater_config["provider"], "github");
        assert!(updater_config.get("token").is_none());
    }

    #[test]
    fn filename_is_transliterated_and_never_empty() {
        let config_accented =
            config("[app]\nname = \"Café Manager\"\nid = \"x\"\nversion = \"1\"\n");
        let dict_env = derive(&config_accented).expect("env");
        assert_eq!(dict_env["NATIVEPHP_APP_FILENAME"], "cafe-manager");

        let config_symbols = config("[app]\nname = \"???\"\nid = \"x\"\nversion = \"1\"\n");
        assert!(matches!(derive(&config_symbols), Err(BuildError::Config(_))));
    }
}
