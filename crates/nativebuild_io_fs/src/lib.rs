//! `nativebuild_io_fs`:
//! Build-tree staging for Electron bundles.
//!
//! - `copy`   : filtered recursive copy into a freshly recreated directory
//! - `keep`   : keep-alive placeholder files
//! - `spec`   : options and errors
//! - `report` : run-time report model
//! - `util`   : shared helper functions

pub mod copy;
pub mod keep;
pub mod report;
pub mod spec;
mod util;

pub use copy::copy_filtered_tree;
pub use keep::{C_PLACEHOLDER_CONTENT, L_PLACEHOLDER_FILES, write_placeholder_files};
pub use report::{ReportCopy, ReportCopyBuilder};
pub use spec::{CopyTreeError, SpecCopyOptions};
