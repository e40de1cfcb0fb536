//! Helpers shared by the link and shell stores.
//!
//! - `environment` - The explicit root/home/cwd value and user path resolution
//! - `manifest` - JSON sidecar read/write
//! - `copy` - File and directory tree copies through the runtime
//! - `rollback` - Guard that deletes partially built entries on failure

mod copy;
mod environment;
mod manifest;
mod rollback;

pub use copy::{copy_file, copy_tree};
pub use environment::{Environment, ROOT_ENV_VAR, resolve_user_path};
pub use manifest::{MANIFEST_FILENAME, load_manifest, save_manifest};
pub use rollback::Rollback;
