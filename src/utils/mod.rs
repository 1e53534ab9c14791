//! Configuration loading.

pub mod toml_config;
