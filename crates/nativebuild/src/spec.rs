//! Build pipeline errors and shared request models.

use std::io;
use std::path::PathBuf;

use nativebuild_io_fs::CopyTreeError;
use thiserror::Error;

use crate::target::SpecBuildTarget;

////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Every failure that aborts a build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Missing or malformed configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Filesystem operation outside the copy step.
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Build-tree staging failed.
    #[error(transparent)]
    Copy(#[from] CopyTreeError),
    /// The toolchain binary could not be started.
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        /// Command line that was attempted.
        command: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The toolchain command exited unsuccessfully.
    #[error("`{command}` failed with {}", format_exit_code(.code))]
    Subprocess {
        /// Command line that was run.
        command: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
    },
    /// A JSON document could not be read or written.
    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        /// Document path.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// Interactive selection failed.
    #[error("Prompt failed: {0}")]
    Prompt(String),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn format_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(n) => format!("exit code {n}"),
        None => "termination by signal".to_string(),
    }
}

/// Result alias used across the build crate.
pub type BuildResult<T> = Result<T, BuildError>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Requests

/// One resolved build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecBuildRequest {
    /// Target OS and optional architecture.
    pub target: SpecBuildTarget,
    /// Publish instead of build. Ignored for `all`.
    pub if_publish: bool,
    /// Attach the final packager run to the terminal.
    pub if_tty: bool,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
