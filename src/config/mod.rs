//! Configuration loading and management.
//!
//! One TOML file describes one server. This module is split into:
//! - [`types`]: config structs and loading
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks that collect every error at once

mod defaults;
mod types;
mod validation;

pub use types::{
    load_all, ChannelConfig, ConfigError, SaslConfig, Secret, ServerConfig, TimingConfig,
};
pub use validation::{validate, validate_all, ValidationError};
