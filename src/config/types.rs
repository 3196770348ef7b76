//! Core configuration types and loading.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use skuzzy_proto::{irc_eq, SaslCredentials, SessionConfig};

use super::defaults::{
    default_connect_timeout_secs, default_max_nick_len, default_pacing_ms, default_port,
    default_read_timeout_secs, default_reconnect_delay_secs, default_true,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A string that never shows up in `Debug` output.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The secret value itself.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"<redacted>\"")
    }
}

/// One IRC network the bot stays connected to.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Unique name; the registry key.
    pub name: String,
    /// Hostname to dial; also used for SNI and keep-alive pings.
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Wrap the TCP stream in TLS.
    #[serde(default = "default_true")]
    pub tls: bool,
    /// Verify the server certificate against the native root store.
    #[serde(default = "default_true")]
    pub verify_cert: bool,
    /// Requested nickname.
    pub nick: String,
    /// Username for USER; defaults to the nickname.
    #[serde(default)]
    pub username: Option<String>,
    /// Realname for USER; defaults to the nickname.
    #[serde(default)]
    pub realname: Option<String>,
    /// Sent to NickServ once registration completes.
    #[serde(default)]
    pub nickserv_password: Option<Secret>,
    /// SASL PLAIN credentials. Without them CAP negotiation is skipped.
    #[serde(default)]
    pub sasl: Option<SaslConfig>,
    #[serde(default = "default_max_nick_len")]
    pub max_nick_len: usize,
    /// Channels to join, in order.
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
    /// Bridge bots whose `<user> ` prefix is stripped from relayed text.
    /// Empty means the prefix is stripped from anyone.
    #[serde(default)]
    pub relay_bots: Vec<String>,
    #[serde(default)]
    pub timing: TimingConfig,
}

impl ServerConfig {
    /// Load one server block from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// `host:port` for dialing.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.nick)
    }

    pub fn realname(&self) -> &str {
        self.realname.as_deref().unwrap_or(&self.nick)
    }

    /// Configured channel matching `name` case-insensitively.
    pub fn channel(&self, name: &str) -> Option<&ChannelConfig> {
        self.channels.iter().find(|c| irc_eq(&c.name, name))
    }

    /// True when `sender` is a listed bridge bot, or when none are listed.
    pub fn is_relay(&self, sender: &str) -> bool {
        self.relay_bots.is_empty() || self.relay_bots.iter().any(|b| irc_eq(b, sender))
    }

    /// Identity handed to the session state machine.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            nickname: self.nick.clone(),
            username: self.username().to_string(),
            realname: self.realname().to_string(),
            nickserv_password: self
                .nickserv_password
                .as_ref()
                .map(|p| p.expose().to_string()),
            sasl: self.sasl.as_ref().map(|s| SaslCredentials {
                user: s.user.clone(),
                password: s.password.expose().to_string(),
            }),
            channels: self.channels.iter().map(|c| c.name.clone()).collect(),
            max_nick_len: self.max_nick_len,
            ping_token: self.host.clone(),
        }
    }
}

/// SASL PLAIN account.
#[derive(Debug, Clone, Deserialize)]
pub struct SaslConfig {
    pub user: String,
    pub password: Secret,
}

/// Per-channel feature settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    /// Language model backend for chat relay; `None` disables it.
    #[serde(default)]
    pub llm: Option<String>,
    /// Prompt names enabled in this channel.
    #[serde(default)]
    pub prompts: Vec<String>,
    /// Feed every message to the challenge checker.
    #[serde(default)]
    pub challenge: bool,
}

/// Timeouts, retry delay and output pacing.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            read_timeout_secs: default_read_timeout_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            pacing_ms: default_pacing_ms(),
        }
    }
}

impl TimingConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

/// Load every file, in order.
pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ServerConfig>, ConfigError> {
    paths.iter().map(ServerConfig::load).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r##"
name = "libera"
host = "irc.libera.chat"
nick = "skuzzy"
realname = "Skuzzy Bot"
nickserv_password = "ns-secret"
relay_bots = ["bridge"]

[sasl]
user = "skuzzy"
password = "sasl-secret"

[[channels]]
name = "#rust"
llm = "deepseek"
prompts = ["default", "pirate"]

[[channels]]
name = "#games"
challenge = true

[timing]
read_timeout_secs = 120
"##;

    #[test]
    fn defaults_apply() {
        let config: ServerConfig =
            toml::from_str("name = \"a\"\nhost = \"irc.example.net\"\nnick = \"bot\"\n").unwrap();
        assert_eq!(config.port, 6697);
        assert!(config.tls);
        assert!(config.verify_cert);
        assert_eq!(config.username(), "bot");
        assert_eq!(config.realname(), "bot");
        assert_eq!(config.max_nick_len, 30);
        assert_eq!(config.timing.read_timeout(), Duration::from_secs(240));
        assert_eq!(config.timing.reconnect_delay(), Duration::from_secs(5));
        assert_eq!(config.timing.pacing(), Duration::from_millis(500));
        assert!(config.channels.is_empty());
    }

    #[test]
    fn full_config_parses() {
        let config: ServerConfig = toml::from_str(FULL).unwrap();
        assert_eq!(config.address(), "irc.libera.chat:6697");
        assert_eq!(config.channels.len(), 2);
        assert_eq!(config.channels[0].llm.as_deref(), Some("deepseek"));
        assert!(config.channels[1].challenge);
        assert_eq!(config.timing.read_timeout_secs, 120);
        assert_eq!(config.timing.reconnect_delay_secs, 5);
    }

    #[test]
    fn secrets_are_not_debug_printed() {
        let config: ServerConfig = toml::from_str(FULL).unwrap();
        let shown = format!("{config:?}");
        assert!(!shown.contains("ns-secret"));
        assert!(!shown.contains("sasl-secret"));
    }

    #[test]
    fn session_config_carries_identity() {
        let config: ServerConfig = toml::from_str(FULL).unwrap();
        let session = config.session_config();
        assert_eq!(session.nickname, "skuzzy");
        assert_eq!(session.realname, "Skuzzy Bot");
        assert_eq!(session.channels, vec!["#rust", "#games"]);
        assert_eq!(session.nickserv_password.as_deref(), Some("ns-secret"));
        assert_eq!(session.sasl.map(|s| s.password).as_deref(), Some("sasl-secret"));
        assert_eq!(session.ping_token, "irc.libera.chat");
    }

    #[test]
    fn channel_lookup_is_case_insensitive() {
        let config: ServerConfig = toml::from_str(FULL).unwrap();
        assert!(config.channel("#RUST").is_some());
        assert!(config.channel("#python").is_none());
    }

    #[test]
    fn relay_detection() {
        let mut config: ServerConfig = toml::from_str(FULL).unwrap();
        assert!(config.is_relay("Bridge"));
        assert!(!config.is_relay("alice"));
        config.relay_bots.clear();
        assert!(config.is_relay("alice"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libera.toml");
        std::fs::write(&path, FULL).unwrap();
        let configs = load_all(&[&path]).unwrap();
        assert_eq!(configs[0].name, "libera");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ServerConfig::load("/nonexistent/skuzzy.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
