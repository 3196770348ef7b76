//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use std::collections::HashSet;

use skuzzy_proto::names::irc_to_lower;
use skuzzy_proto::{is_channel_name, NickExt};
use thiserror::Error;

use super::ServerConfig;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server name is required")]
    MissingServerName,
    #[error("{0}: host is required")]
    MissingHost(String),
    #[error("{0}: nick is required")]
    MissingNick(String),
    #[error("{server}: nick '{nick}' is not a valid nickname")]
    InvalidNick { server: String, nick: String },
    #[error("{server}: nick '{nick}' is longer than max_nick_len {max}")]
    NickTooLong {
        server: String,
        nick: String,
        max: usize,
    },
    #[error("{server}: '{channel}' is not a valid channel name")]
    InvalidChannel { server: String, channel: String },
    #[error("{server}: channel '{channel}' is listed twice")]
    DuplicateChannel { server: String, channel: String },
    #[error("{server}: timing.{field} must be greater than zero")]
    ZeroTimeout { server: String, field: &'static str },
    #[error("{0}: sasl.user is required when [sasl] is present")]
    MissingSaslUser(String),
    #[error("server name '{0}' is used by more than one config")]
    DuplicateServer(String),
}

/// Validate one server, returning all errors found.
pub fn validate(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_server(config, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate every server plus cross-file rules.
pub fn validate_all(configs: &[ServerConfig]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for config in configs {
        check_server(config, &mut errors);
        if !config.name.is_empty() && !seen.insert(config.name.as_str()) {
            errors.push(ValidationError::DuplicateServer(config.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_server(config: &ServerConfig, errors: &mut Vec<ValidationError>) {
    let server = &config.name;

    // Required fields
    if server.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }
    if config.host.is_empty() {
        errors.push(ValidationError::MissingHost(server.clone()));
    }

    // Nickname
    if config.nick.is_empty() {
        errors.push(ValidationError::MissingNick(server.clone()));
    } else if config.nick.len() > config.max_nick_len {
        errors.push(ValidationError::NickTooLong {
            server: server.clone(),
            nick: config.nick.clone(),
            max: config.max_nick_len,
        });
    } else if !config.nick.is_valid_nick_len(config.max_nick_len) {
        errors.push(ValidationError::InvalidNick {
            server: server.clone(),
            nick: config.nick.clone(),
        });
    }

    // Channels
    let mut channels = HashSet::new();
    for channel in &config.channels {
        if !is_channel_name(&channel.name) {
            errors.push(ValidationError::InvalidChannel {
                server: server.clone(),
                channel: channel.name.clone(),
            });
        } else if !channels.insert(irc_to_lower(&channel.name)) {
            errors.push(ValidationError::DuplicateChannel {
                server: server.clone(),
                channel: channel.name.clone(),
            });
        }
    }

    if let Some(ref sasl) = config.sasl
        && sasl.user.is_empty()
    {
        errors.push(ValidationError::MissingSaslUser(server.clone()));
    }

    // Timing
    let timing = &config.timing;
    for (field, value) in [
        ("read_timeout_secs", timing.read_timeout_secs),
        ("connect_timeout_secs", timing.connect_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout {
                server: server.clone(),
                field,
            });
        }
    }
}
