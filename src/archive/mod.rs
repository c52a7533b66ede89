//! Zip handling for uploads and results.
//!
//! - [`extract`] persists an uploaded zip and unpacks it into a workspace
//! - [`locate`] finds the `.gdb` container inside the unpacked tree
//! - [`package`] bundles converted spreadsheets into an in-memory zip

pub mod extract;
pub mod locate;
pub mod package;

pub use extract::{extract_upload, save_upload, unpack};
pub use locate::{find_container, CONTAINER_SUFFIX};
pub use package::package_files;
