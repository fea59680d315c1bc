//! Copy options and top-level error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region StructsInit

/// Input options for [`crate::copy_filtered_tree`].
#[derive(Debug, Clone)]
pub struct SpecCopyOptions {
    /// Exclusion globs matched against each entry's `/`-separated path
    /// relative to the source root. A match drops the entry and its subtree.
    pub patterns_exclude: Vec<String>,
    /// Write the keep-alive placeholder files after the walk.
    pub if_write_placeholders: bool,
    /// Carry permissions, timestamps and extended attributes over to copies.
    pub if_preserve_metadata: bool,
}

impl Default for SpecCopyOptions {
    fn default() -> Self {
        Self {
            patterns_exclude: Vec::new(),
            if_write_placeholders: true,
            if_preserve_metadata: true,
        }
    }
}

impl SpecCopyOptions {
    /// Options excluding `patterns_exclude`, everything else default.
    pub fn with_patterns<I, S>(patterns_exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns_exclude: patterns_exclude.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Failures that abort a copy run.
///
/// Nothing is rolled back: whatever was written to the destination before the
/// failure stays there until the next run wipes it.
#[derive(Debug, Error)]
pub enum CopyTreeError {
    /// Invalid exclusion pattern.
    #[error("Invalid exclusion pattern `{pattern}`: {message}")]
    InvalidPattern {
        /// Offending pattern text.
        pattern: String,
        /// Parser message.
        message: String,
    },
    /// Source path is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Destination contains the source, so wiping it would destroy the input.
    #[error(
        "Source lies inside destination: {} <-> {}",
        .source_dir.display(),
        .destination.display()
    )]
    SourceDestinationOverlap {
        /// Normalized source directory.
        source_dir: PathBuf,
        /// Normalized destination directory.
        destination: PathBuf,
    },
    /// Destination could not be removed or recreated.
    #[error("Failed to initialize destination {}: {source}", .path.display())]
    DestinationInit {
        /// Destination path that failed initialization.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Reading a source entry or writing its copy failed.
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        /// Source or destination path involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl CopyTreeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
