//! Layered configuration: defaults, config files, environment, overrides

pub mod defaults;
pub mod settings;

pub use settings::{discover_config_file, Environment, Overrides, RotationConfig, Settings};
