//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Connection Defaults
// =============================================================================

/// TLS IRC port.
pub fn default_port() -> u16 {
    6697
}

pub fn default_max_nick_len() -> usize {
    skuzzy_proto::DEFAULT_NICK_MAX_LEN
}

// =============================================================================
// Timing Defaults
// =============================================================================

/// Idle read deadline before a keep-alive ping is sent.
pub fn default_read_timeout_secs() -> u64 {
    240
}

pub fn default_reconnect_delay_secs() -> u64 {
    5
}

pub fn default_connect_timeout_secs() -> u64 {
    30
}

/// Delay between continuation fragments and paced lines.
pub fn default_pacing_ms() -> u64 {
    500
}
