//! CLI command modules

pub mod build;
pub mod clean;
pub mod content;
pub mod init;
pub mod plugins;
pub mod resolve;
pub mod validate;
