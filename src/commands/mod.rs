//! Command handlers behind the CLI.
//!
//! Each handler resolves package names through the configured resolver,
//! calls exactly one store and prints the result.

pub mod config;
mod link;
mod provider;
mod shell;

pub use config::Config;
pub use link::{LinkSelector, link_add, link_edit, link_list, link_remove, link_status};
pub use provider::provider_list;
pub use shell::{activate, shell_edit, shell_set, shell_set_enabled, shell_show, shell_unset};
