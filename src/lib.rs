pub mod commands;
pub mod error;
pub mod link;
pub mod package;
pub mod provider;
pub mod runtime;
pub mod shell;
pub mod store;
