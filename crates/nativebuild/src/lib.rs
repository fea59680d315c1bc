//! `nativebuild`:
//! Package a web application into an Electron desktop bundle.
//!
//! - `conf`         : `nativebuild.toml` loading and derived paths
//! - `env`          : environment handed to the packager
//! - `housekeeping` : Build Tree preparation steps
//! - `pipeline`     : the ordered end-to-end build
//! - `process`      : toolchain subprocess runner
//! - `spec`         : errors and request models
//! - `target`       : OS / architecture selection
//! - `updater`      : auto-updater publish options

pub mod conf;
pub mod env;
pub mod housekeeping;
pub mod pipeline;
pub mod process;
pub mod spec;
pub mod target;
pub mod updater;
mod util;

pub use conf::SpecBuildConfig;
pub use pipeline::{BuildPipeline, ReportBuild};
pub use process::{ProcessRunner, SystemProcessRunner};
pub use spec::{BuildError, BuildResult, SpecBuildRequest};
pub use target::{DialoguerSelector, Selector, SpecBuildTarget, select_target};
