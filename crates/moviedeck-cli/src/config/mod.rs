//! Application configuration module.
//!
//! Manages the TOML config file (`config.toml`) and the data directory that
//! holds stored preferences.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::AppConfig;
pub use paths::{resolve_config_path, resolve_data_dir};
