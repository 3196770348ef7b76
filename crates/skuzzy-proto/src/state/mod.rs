//! Sans-IO session state machine.
//!
//! [`SessionMachine`] owns the lifecycle of one connection attempt without
//! doing any I/O itself. The driver dials, then feeds it classified inbound
//! events and read timeouts; the machine answers with [`Action`]s to carry
//! out. Everything here is deterministic and testable without a socket.
//!
//! ```
//! use skuzzy_proto::state::{Action, Phase, SessionConfig, SessionMachine};
//! use skuzzy_proto::{InboundEvent, MessageRef};
//!
//! let mut machine = SessionMachine::new(SessionConfig::new("skuzzy", vec!["#rust".into()]));
//! let actions = machine.start();
//! assert!(matches!(&actions[0], Action::Send(line) if line == "NICK skuzzy"));
//!
//! let mode = MessageRef::parse(":skuzzy MODE skuzzy :+i").unwrap();
//! let actions = machine.handle(&InboundEvent::classify(&mode, machine.nick()));
//! assert!(actions.iter().any(|a| matches!(a, Action::Send(l) if l == "JOIN #rust")));
//! assert_eq!(machine.phase(), Phase::SteadyState);
//! ```

mod machine;
mod transitions;

pub use machine::SessionMachine;

use thiserror::Error;

use crate::names::DEFAULT_NICK_MAX_LEN;

/// Consecutive read timeouts without any inbound line before giving up.
pub const MAX_UNANSWERED_PINGS: u8 = 2;

/// Lifecycle phase of one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Phase {
    /// Opening the encrypted stream.
    #[default]
    Dialing,
    /// `CAP REQ :sasl` sent, awaiting ACK.
    CapNegotiating,
    /// SASL PLAIN exchange in progress.
    Authenticating,
    /// NICK/USER sent, awaiting the registration MODE line.
    Registering,
    /// Issuing JOINs.
    Joining,
    /// Reading indefinitely.
    SteadyState,
    /// Finished; the driver tears the connection down.
    Terminal,
}

impl Phase {
    /// Short label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dialing => "dialing",
            Self::CapNegotiating => "cap-negotiating",
            Self::Authenticating => "authenticating",
            Self::Registering => "registering",
            Self::Joining => "joining",
            Self::SteadyState => "steady-state",
            Self::Terminal => "terminal",
        }
    }
}

/// SASL PLAIN credentials.
#[derive(Clone)]
pub struct SaslCredentials {
    /// Account name.
    pub user: String,
    /// Account password.
    pub password: String,
}

impl std::fmt::Debug for SaslCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaslCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Identity and targets for one session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Requested nickname.
    pub nickname: String,
    /// Username sent in USER.
    pub username: String,
    /// Realname sent in USER.
    pub realname: String,
    /// NickServ password; IDENTIFY is sent once registration completes.
    pub nickserv_password: Option<String>,
    /// SASL credentials; `None` skips capability negotiation.
    pub sasl: Option<SaslCredentials>,
    /// Channels to join, in order.
    pub channels: Vec<String>,
    /// Longest nickname the collision handler may produce.
    pub max_nick_len: usize,
    /// Token sent in our own keep-alive pings.
    pub ping_token: String,
}

impl SessionConfig {
    /// Minimal config: nickname doubles as username and realname.
    pub fn new(nickname: impl Into<String>, channels: Vec<String>) -> Self {
        let nickname = nickname.into();
        Self {
            username: nickname.clone(),
            realname: nickname.clone(),
            ping_token: nickname.clone(),
            nickname,
            nickserv_password: None,
            sasl: None,
            channels,
            max_nick_len: DEFAULT_NICK_MAX_LEN,
        }
    }
}

/// What the driver must do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Write this line (CRLF is added by the writer).
    Send(String),
    /// Write this line but never log its contents.
    SendSecret(String),
    /// Registration finished and joins were issued.
    Ready,
    /// Stop the session.
    Terminate(TerminalReason),
}

/// Why a session ended.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TerminalReason {
    /// The server refused the `sasl` capability.
    #[error("capability rejected: {0}")]
    CapRejected(String),
    /// SASL failure numeric.
    #[error("SASL authentication failed ({0})")]
    AuthRejected(u16),
    /// Every nickname up to the length cap is taken.
    #[error("no free nickname left after {0}")]
    NickExhausted(String),
    /// The server sent ERROR.
    #[error("server error: {0}")]
    ServerError(String),
    /// Read timeouts with no traffic in between.
    #[error("keep-alive timeout after {0} unanswered pings")]
    KeepaliveTimeout(u8),
}
