//! Build Tree preparation steps run around the copy.

mod app_name;
mod env_file;
mod icon;
mod vendor;

pub use app_name::set_app_name;
pub use env_file::{clean_env_file, derive_cleaned_env};
pub use icon::{L_ICON_TARGETS, install_icons};
pub use vendor::{L_VENDOR_PRUNE_DIRS, prune_vendor_directory};
