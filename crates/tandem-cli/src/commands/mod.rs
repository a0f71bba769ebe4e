//! CLI command implementations.

pub mod common;
pub mod init_config;
pub mod render;
pub mod units;
