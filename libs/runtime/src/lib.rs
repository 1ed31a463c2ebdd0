//! Process-level plumbing shared by the CareFlow binaries:
//! layered configuration, logging and home directory resolution.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    AppConfig, CliOverrides, DatabaseConfig, LogSection, LoggingConfig, ServerConfig,
};
