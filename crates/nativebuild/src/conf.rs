//! Build configuration: constants, TOML models and derived paths.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::spec::{BuildError, BuildResult};

/// Default configuration file name inside the application root.
pub const C_CONFIG_FILE_NAME: &str = "nativebuild.toml";
/// Electron project location relative to the application root.
pub const C_ELECTRON_PATH_DEFAULT: &str = "vendor/nativephp/electron/resources/js";
/// Runtime binary package location relative to the application root.
pub const C_BINARY_PACKAGE_DEFAULT: &str = "vendor/nativephp/php-bin/";
/// Runtime version shipped with the bundle.
pub const C_RUNTIME_VERSION_DEFAULT: &str = "8.3";
/// Application URL when none is configured.
pub const C_APP_URL_DEFAULT: &str = "http://localhost";

/// Exclusions applied to every build, ahead of `cleanup.exclude_files`.
pub const L_EXCLUDE_FILES_INTERNAL: [&str; 6] = [
    ".git",
    "build",
    "temp",
    "content",
    "node_modules",
    "*/tests",
];

/// `.env` keys stripped from the staged copy unless configured otherwise.
pub const L_CLEANUP_ENV_KEYS_DEFAULT: [&str; 8] = [
    "AWS_*",
    "GITHUB_*",
    "DO_SPACES_*",
    "*_SECRET",
    "NATIVEPHP_UPDATER_PATH",
    "NATIVEPHP_APPLE_ID",
    "NATIVEPHP_APPLE_ID_PASS",
    "NATIVEPHP_APPLE_TEAM_ID",
];

////////////////////////////////////////////////////////////////////////////////
// #region ConfigModels

/// `[app]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecAppConfig {
    pub name: String,
    /// Reverse-DNS application id, e.g. `com.example.app`.
    pub id: String,
    pub version: String,
    pub url: String,
    pub author: String,
    /// URL scheme registered for deep links.
    pub deeplink_scheme: String,
}

impl Default for SpecAppConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            id: String::new(),
            version: String::new(),
            url: C_APP_URL_DEFAULT.to_string(),
            author: String::new(),
            deeplink_scheme: String::new(),
        }
    }
}

/// `[paths]` table. Relative paths resolve against the application root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecPathsConfig {
    /// Directory holding the Electron `package.json`.
    pub electron: PathBuf,
    /// Runtime binary package directory (trailing `/` expected).
    pub binary_package: String,
    /// Runtime version identifier, `major.minor`.
    pub runtime_version: String,
}

impl Default for SpecPathsConfig {
    fn default() -> Self {
        Self {
            electron: PathBuf::from(C_ELECTRON_PATH_DEFAULT),
            binary_package: C_BINARY_PACKAGE_DEFAULT.to_string(),
            runtime_version: C_RUNTIME_VERSION_DEFAULT.to_string(),
        }
    }
}

/// `[cleanup]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecCleanupConfig {
    /// User exclusion globs, merged after [`L_EXCLUDE_FILES_INTERNAL`].
    pub exclude_files: Vec<String>,
    /// `.env` key patterns removed from the staged copy (`*` wildcard).
    pub env_keys: Vec<String>,
}

impl Default for SpecCleanupConfig {
    fn default() -> Self {
        Self {
            exclude_files: Vec::new(),
            env_keys: L_CLEANUP_ENV_KEYS_DEFAULT.map(String::from).to_vec(),
        }
    }
}

/// GitHub releases provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(
    default,
    deny_unknown_fields,
    rename_all(serialize = "camelCase", deserialize = "snake_case")
)]
pub struct SpecGithubProvider {
    pub repo: String,
    pub owner: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub v_prefixed_tag_name: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_type: Option<String>,
    pub private: bool,
}

/// S3-compatible bucket provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(
    default,
    deny_unknown_fields,
    rename_all(serialize = "camelCase", deserialize = "snake_case")
)]
pub struct SpecS3Provider {
    #[serde(skip_serializing)]
    pub key: String,
    #[serde(skip_serializing)]
    pub secret: String,
    pub region: String,
    pub bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// DigitalOcean Spaces provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(
    default,
    deny_unknown_fields,
    rename_all(serialize = "camelCase", deserialize = "snake_case")
)]
pub struct SpecSpacesProvider {
    #[serde(skip_serializing)]
    pub key: String,
    #[serde(skip_serializing)]
    pub secret: String,
    pub name: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// `[updater.providers]` table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecUpdaterProviders {
    pub github: Option<SpecGithubProvider>,
    pub s3: Option<SpecS3Provider>,
    pub spaces: Option<SpecSpacesProvider>,
}

/// `[updater]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecUpdaterConfig {
    pub enabled: bool,
    /// Name of the provider used for publishing: `github`, `s3` or `spaces`.
    #[serde(rename = "default")]
    pub provider_default: String,
    pub providers: SpecUpdaterProviders,
}

impl Default for SpecUpdaterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider_default: "github".to_string(),
            providers: SpecUpdaterProviders::default(),
        }
    }
}

/// Whole configuration, plus the application root it was loaded for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecBuildConfig {
    pub app: SpecAppConfig,
    pub paths: SpecPathsConfig,
    pub cleanup: SpecCleanupConfig,
    pub updater: SpecUpdaterConfig,
    #[serde(skip)]
    pub path_app_root: PathBuf,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Loading

impl SpecBuildConfig {
    /// Load `path_config` (default `<app root>/nativebuild.toml`) and validate.
    pub fn load(path_app_root: &Path, path_config: Option<&Path>) -> BuildResult<Self> {
        let path_app_root = fs::canonicalize(path_app_root).map_err(|e| {
            BuildError::Config(format!(
                "Application root {} is not accessible: {e}",
                path_app_root.display()
            ))
        })?;
        let path_config = match path_config {
            Some(p) => p.to_path_buf(),
            None => path_app_root.join(C_CONFIG_FILE_NAME),
        };

        let txt = fs::read_to_string(&path_config).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => BuildError::Config(format!(
                "Config file not found: {}",
                path_config.display()
            )),
            _ => BuildError::io(&path_config, e),
        })?;
        log::debug!("Loaded config from {}", path_config.display());
        Self::from_toml_str(&txt, path_app_root)
    }

    /// Parse TOML text and validate it for `path_app_root`.
    pub fn from_toml_str(txt: &str, path_app_root: PathBuf) -> BuildResult<Self> {
        let mut config: Self =
            toml::from_str(txt).map_err(|e| BuildError::Config(e.to_string()))?;
        config.path_app_root = path_app_root;
        config.validate()?;
        Ok(config)
    }

    /// Check required values and the updater provider selection.
    pub fn validate(&self) -> BuildResult<()> {
        for (c_key, value) in [
            ("app.name", &self.app.name),
            ("app.id", &self.app.id),
            ("app.version", &self.app.version),
        ] {
            if value.trim().is_empty() {
                return Err(BuildError::Config(format!("`{c_key}` must not be empty")));
            }
        }

        if self.updater.enabled {
            let providers = &self.updater.providers;
            let b_configured = match self.updater.provider_default.as_str() {
                "github" => providers.github.is_some(),
                "s3" => providers.s3.is_some(),
                "spaces" => providers.spaces.is_some(),
                other => {
                    return Err(BuildError::Config(format!(
                        "Unknown updater provider `{other}`. Expected one of: ['github', 's3', 'spaces']"
                    )));
                }
            };
            if !b_configured {
                return Err(BuildError::Config(format!(
                    "Updater provider `{}` is enabled but `[updater.providers.{}]` is missing",
                    self.updater.provider_default, self.updater.provider_default
                )));
            }
        }
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DerivedPaths

impl SpecBuildConfig {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.path_app_root.join(path)
        }
    }

    /// Electron project directory, where `npm` runs.
    pub fn path_electron(&self) -> PathBuf {
        self.resolve(&self.paths.electron)
    }

    /// Electron `package.json`.
    pub fn path_package_json(&self) -> PathBuf {
        self.path_electron().join("package.json")
    }

    /// Build Tree: the staged application copy.
    pub fn path_build(&self) -> PathBuf {
        self.path_electron().join("resources").join("app")
    }

    /// Directory holding the runtime binaries.
    pub fn path_runtime_binary(&self) -> PathBuf {
        self.resolve(Path::new(&format!("{}bin/", self.paths.binary_package)))
    }

    /// CA bundle shipped next to the runtime binaries.
    pub fn path_certificate(&self) -> PathBuf {
        self.resolve(Path::new(&format!("{}cacert.pem", self.paths.binary_package)))
    }

    /// Internal exclusions followed by the user's.
    pub fn patterns_exclude(&self) -> Vec<String> {
        L_EXCLUDE_FILES_INTERNAL
            .iter()
            .map(|p| p.to_string())
            .chain(self.cleanup.exclude_files.iter().cloned())
            .collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
