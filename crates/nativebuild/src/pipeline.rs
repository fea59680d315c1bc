//! End-to-end build: stage the app, then hand it to the Electron packager.

use std::collections::BTreeMap;
use std::fmt;

use nativebuild_io_fs::{ReportCopy, SpecCopyOptions, copy_filtered_tree};
use nativebuild_log::{intro, note};

use crate::conf::SpecBuildConfig;
use crate::env::derive_build_environment;
use crate::housekeeping::{clean_env_file, install_icons, prune_vendor_directory, set_app_name};
use crate::process::{ProcessRunner, SpecProcess, echo_line};
use crate::spec::{BuildResult, SpecBuildRequest};
use crate::updater::Updater;

/// Outcome of a successful [`BuildPipeline::run`].
#[derive(Debug, Clone, Default)]
pub struct ReportBuild {
    /// `npm run` script that produced the bundle.
    pub script_name: String,
    /// Build Tree staging counters.
    pub report_copy: ReportCopy,
    /// Icon files written into the Electron project.
    pub cnt_icons: usize,
}

impl fmt::Display for ReportBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[BUILD] script={} icons={} {}",
            self.script_name, self.cnt_icons, self.report_copy
        )
    }
}

/// Sequential build driver. The first failing step aborts the run.
pub struct BuildPipeline<'a> {
    config: &'a SpecBuildConfig,
    runner: &'a dyn ProcessRunner,
}

impl<'a> BuildPipeline<'a> {
    pub fn new(config: &'a SpecBuildConfig, runner: &'a dyn ProcessRunner) -> Self {
        Self { config, runner }
    }

    pub fn run(&self, request: &SpecBuildRequest) -> BuildResult<ReportBuild> {
        let config = self.config;
        let dict_env = derive_build_environment(config, &Updater::new(&config.updater))?;
        let path_electron = config.path_electron();
        let path_build = config.path_build();
        let script_name = request.target.derive_script_name(request.if_publish);

        set_app_name(&config.path_package_json(), &config.app.name, true)?;

        intro("Updating Electron dependencies...");
        self.run_npm(["ci"], &dict_env, false)?;

        intro("Copying app to build directory...");
        note(&format!("From {}", config.path_app_root.display()));
        note(&format!("To {}", path_build.display()));
        let report_copy = copy_filtered_tree(
            &config.path_app_root,
            &path_build,
            SpecCopyOptions::with_patterns(config.patterns_exclude()),
        )?;
        note(&report_copy.to_string());

        intro("Cleaning .env file...");
        clean_env_file(&path_build, &config.cleanup.env_keys)?;

        intro("Copying app icons...");
        let cnt_icons = install_icons(&config.path_app_root, &path_electron)?;

        intro("Pruning vendor directory...");
        prune_vendor_directory(self.runner, &path_build, &dict_env)?;

        let c_verb = if script_name.starts_with("publish:") {
            "Publishing"
        } else {
            "Building"
        };
        intro(&format!("{c_verb} for {}", request.target));
        self.run_npm(["run", script_name.as_str()], &dict_env, request.if_tty)?;

        Ok(ReportBuild {
            script_name,
            report_copy,
            cnt_icons,
        })
    }

    fn run_npm<'s>(
        &self,
        args: impl IntoIterator<Item = &'s str>,
        dict_env: &BTreeMap<String, String>,
        if_tty: bool,
    ) -> BuildResult<()> {
        let spec_process = SpecProcess::new("npm", args, &self.config.path_electron())
            .with_envs(dict_env.clone())
            .with_tty(if_tty);
        self.runner.run(&spec_process, &mut echo_line)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::BuildPipeline;
    use crate::conf::SpecBuildConfig;
    use crate::process::RecordingRunner;
    use crate::spec::{BuildError, SpecBuildRequest};
    use crate::target::{EnumBuildArch, EnumBuildOs, SpecBuildTarget};

    const C_CONFIG: &str = "\
[app]
name = \"Demo App\"
id = \"com.example.demo\"
version = \"1.2.3\"

[cleanup]
exclude_files = [\"cache/*\"]
";

    fn write(path: &Path, txt: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, txt).expect("write");
    }

    fn scaffold_app(root: &Path) -> SpecBuildConfig {
        write(&root.join("app/Foo.php"), "<?php");
        write(&root.join("cache/x.tmp"), "tmp");
        write(&root.join(".env"), "APP_NAME=Demo\nAWS_SECRET_ACCESS_KEY=s\n# note\n");
        write(&root.join("node_modules/left-pad/index.js"), "");
        write(&root.join("public/icon.png"), "png");
        write(&root.join("vendor/bin/phpunit"), "");
        write(&root.join("vendor/nativephp/php-bin/bin/php"), "");
        write(
            &root.join("vendor/nativephp/electron/resources/js/package.json"),
            r#"{"name": "nativephp", "private": true}"#,
        );
        SpecBuildConfig::from_toml_str(C_CONFIG, root.to_path_buf()).expect("config")
    }

    fn request(if_publish: bool) -> SpecBuildRequest {
        SpecBuildRequest {
            target: SpecBuildTarget {
                os: EnumBuildOs::Mac,
                arch: Some(EnumBuildArch::Arm64),
            },
            if_publish,
            if_tty: false,
        }
    }

    #[test]
    fn pipeline_runs_steps_in_order() {
        let tmp = TempDir::new().expect("tmp");
        let config = scaffold_app(tmp.path());
        let runner = RecordingRunner::default();

        let report = BuildPipeline::new(&config, &runner)
            .run(&request(false))
            .expect("build");

        assert_eq!(report.script_name, "build:mac-arm64");
        assert_eq!(report.cnt_icons, 2);

        let l_commands: Vec<String> = runner.calls().iter().map(|c| c.command_line()).collect();
        assert_eq!(
            l_commands,
            ["npm ci", "composer install --no-dev", "npm run build:mac-arm64"]
        );
        let l_calls = runner.calls();
        assert_eq!(l_calls[0].path_dir, config.path_electron());
        assert_eq!(l_calls[1].path_dir, config.path_build());
        assert_eq!(
            l_calls[2].envs.get("NATIVEPHP_APP_FILENAME").map(String::as_str),
            Some("demo-app")
        );

        let path_build = config.path_build();
        assert!(path_build.join("app/Foo.php").is_file());
        assert!(!path_build.join("cache/x.tmp").exists());
        assert!(!path_build.join("node_modules").exists());
        assert!(!path_build.join("vendor/bin").exists());
        assert!(!path_build.join("vendor/nativephp/php-bin").exists());
        assert_eq!(
            fs::read_to_string(path_build.join("storage/logs/_native.json")).expect("placeholder"),
            "{}"
        );
        assert_eq!(
            fs::read_to_string(path_build.join(".env")).expect("env"),
            "APP_NAME=Demo\n"
        );
        assert!(config.path_electron().join("build/icon.png").is_file());

        let package: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(config.path_package_json()).expect("package.json"),
        )
        .expect("json");
        assert_eq!(package["name"], "demo-app");
    }

    #[test]
    fn publish_uses_publish_script() {
        let tmp = TempDir::new().expect("tmp");
        let config = scaffold_app(tmp.path());
        let runner = RecordingRunner::default();

        let report = BuildPipeline::new(&config, &runner)
            .run(&request(true))
            .expect("publish");
        assert_eq!(report.script_name, "publish:mac-arm64");
    }

    #[test]
    fn failed_install_stops_before_copy() {
        let tmp = TempDir::new().expect("tmp");
        let config = scaffold_app(tmp.path());
        let runner = RecordingRunner::failing_on("npm");

        let err = BuildPipeline::new(&config, &runner)
            .run(&request(false))
            .expect_err("npm ci fails");

        assert!(matches!(err, BuildError::Subprocess { .. }));
        assert_eq!(runner.calls().len(), 1);
        assert!(!config.path_build().exists());
    }
}
