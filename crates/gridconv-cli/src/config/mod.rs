//! Layered configuration: built-in defaults, the TOML file, `--set` overrides, then CLI flags.

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;
