//! Auto-updater publish options and credentials handed to the packager.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::conf::{SpecGithubProvider, SpecS3Provider, SpecSpacesProvider, SpecUpdaterConfig};

/// Provider selected for publishing, tagged with its `provider` name.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum EnumUpdaterProvider<'a> {
    Github(&'a SpecGithubProvider),
    S3(&'a SpecS3Provider),
    Spaces(&'a SpecSpacesProvider),
}

/// Read-only view over `[updater]`.
#[derive(Debug, Clone, Copy)]
pub struct Updater<'a> {
    spec_updater: &'a SpecUpdaterConfig,
}

impl<'a> Updater<'a> {
    pub fn new(spec_updater: &'a SpecUpdaterConfig) -> Self {
        Self { spec_updater }
    }

    /// Active provider; `None` when updates are disabled or unconfigured.
    pub fn provider(&self) -> Option<EnumUpdaterProvider<'a>> {
        if !self.spec_updater.enabled {
            return None;
        }
        let providers = &self.spec_updater.providers;
        match self.spec_updater.provider_default.as_str() {
            "github" => providers.github.as_ref().map(EnumUpdaterProvider::Github),
            "s3" => providers.s3.as_ref().map(EnumUpdaterProvider::S3),
            "spaces" => providers.spaces.as_ref().map(EnumUpdaterProvider::Spaces),
            _ => None,
        }
    }

    /// electron-builder `publish` options; `{}` without an active provider.
    ///
    /// Secrets are never part of the options; they travel as environment
    /// variables only.
    pub fn builder_options(&self) -> Value {
        self.provider()
            .and_then(|provider| serde_json::to_value(provider).ok())
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Credential variables the provider's uploader reads.
    pub fn environment_variables(&self) -> BTreeMap<String, String> {
        let mut dict_env = BTreeMap::new();
        match self.provider() {
            Some(EnumUpdaterProvider::Github(github)) => {
                dict_env.insert("GH_TOKEN".to_string(), github.token.clone());
            }
            Some(EnumUpdaterProvider::S3(s3)) => {
                dict_env.insert("AWS_ACCESS_KEY_ID".to_string(), s3.key.clone());
                dict_env.insert("AWS_SECRET_ACCESS_KEY".to_string(), s3.secret.clone());
            }
            Some(EnumUpdaterProvider::Spaces(spaces)) => {
                dict_env.insert("DO_KEY_ID".to_string(), spaces.key.clone());
                dict_env.insert("DO_SECRET_KEY".to_string(), spaces.secret.clone());
            }
            None => {}
        }
        dict_env
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Updater;
    use crate::conf::{
        SpecGithubProvider, SpecS3Provider, SpecSpacesProvider, SpecUpdaterConfig,
        SpecUpdaterProviders,
    };

    fn spec_github() -> SpecGithubProvider {
        SpecGithubProvider {
            repo: "demo".to_string(),
            owner: "acme".to_string(),
            token: "ghp_secret".to_string(),
            v_prefixed_tag_name: true,
            release_type: Some("draft".to_string()),
            ..SpecGithubProvider::default()
        }
    }

    #[test]
    fn disabled_updater_yields_empty_options() {
        let spec_updater = SpecUpdaterConfig {
            enabled: false,
            providers: SpecUpdaterProviders {
                github: Some(spec_github()),
                ..SpecUpdaterProviders::default()
            },
            ..SpecUpdaterConfig::default()
        };
        let updater = Updater::new(&spec_updater);
        assert_eq!(updater.builder_options(), json!({}));
        assert!(updater.environment_variables().is_empty());
    }

    #[test]
    fn github_options_are_camel_case_without_token() {
        let spec_updater = SpecUpdaterConfig {
            enabled: true,
            providers: SpecUpdaterProviders {
                github: Some(spec_github()),
                ..SpecUpdaterProviders::default()
            },
            ..SpecUpdaterConfig::default()
        };
        let updater = Updater::new(&spec_updater);

        assert_eq!(
            updater.builder_options(),
            json!({
                "provider": "github",
                "repo": "demo",
                "owner": "acme",
                "vPrefixedTagName": true,
                "releaseType": "draft",
                "private": false,
            })
        );
        assert_eq!(
            updater.environment_variables().get("GH_TOKEN").map(String::as_str),
            Some("ghp_secret")
        );
    }

    #[test]
    fn s3_and_spaces_export_their_credentials() {
        let spec_updater = SpecUpdaterConfig {
            enabled: true,
            provider_default: "s3".to_string(),
            providers: SpecUpdaterProviders {
                s3: Some(SpecS3Provider {
                    key: "k".to_string(),
                    secret: "s".to_string(),
                    region: "eu-west-1".to_string(),
                    bucket: "releases".to_string(),
                    ..SpecS3Provider::default()
                }),
                spaces: Some(SpecSpacesProvider {
                    key: "dk".to_string(),
                    secret: "ds".to_string(),
                    name: "space".to_string(),
                    region: "ams3".to_string(),
                    ..SpecSpacesProvider::default()
                }),
                ..SpecUpdaterProviders::default()
            },
        };

        let updater = Updater::new(&spec_updater);
        let dict_env = updater.environment_variables();
        assert_eq!(dict_env.get("AWS_ACCESS_KEY_ID").map(String::as_str), Some("k"));
        assert_eq!(dict_env.get("AWS_SECRET_ACCESS_KEY").map(String::as_str), Some("s"));
        assert_eq!(
            updater.builder_options(),
            json!({"provider": "s3", "region": "eu-west-1", "bucket": "releases"})
        );

        let spec_updater = SpecUpdaterConfig {
            provider_default: "spaces".to_string(),
            ..spec_updater
        };
        let updater = Updater::new(&spec_updater);
        assert_eq!(
            updater.environment_variables().get("DO_KEY_ID").map(String::as_str),
            Some("dk")
        );
        assert_eq!(updater.builder_options()["provider"], "spaces");
    }
}
