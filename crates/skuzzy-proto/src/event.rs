//! Classification of inbound lines.
//!
//! Everything the session or the dispatcher reacts to becomes one
//! [`InboundEvent`]; the rest collapses into [`InboundEvent::Other`].

use crate::message::MessageRef;
use crate::names::irc_eq;

/// Result codes of a SASL exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaslOutcome {
    /// 900 RPL_LOGGEDIN.
    LoggedIn,
    /// 903 RPL_SASLSUCCESS.
    Success,
    /// 902, 904-907: nick locked, failed, too long, aborted, already authed.
    Failed(u16),
}

/// A classified inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent<'a> {
    /// `CAP * ACK :caps`.
    CapAck {
        /// Space-separated acknowledged capabilities.
        caps: &'a str,
    },
    /// `CAP * NAK :caps`.
    CapNak {
        /// Space-separated rejected capabilities.
        caps: &'a str,
    },
    /// `AUTHENTICATE <data>`; `+` means "send your payload".
    AuthChallenge {
        /// Challenge data.
        data: &'a str,
    },
    /// A SASL numeric.
    Sasl(SaslOutcome),
    /// Server keep-alive request.
    Ping {
        /// Token to echo back, if any.
        token: Option<&'a str>,
    },
    /// Answer to our own keep-alive ping.
    Pong,
    /// 001 RPL_WELCOME.
    Welcome,
    /// 433 ERR_NICKNAMEINUSE.
    NickInUse {
        /// The nickname that was refused.
        nick: &'a str,
    },
    /// A MODE line for our own nickname, sent once registration is done.
    OwnMode,
    /// `PRIVMSG target :text`.
    Targeted {
        /// Sender nickname (or server name when no user prefix is present).
        sender: &'a str,
        /// Channel or nickname the text was sent to.
        target: &'a str,
        /// Message body.
        text: &'a str,
    },
    /// `ERROR :reason` from the server.
    ServerError {
        /// Reason given, possibly empty.
        reason: &'a str,
    },
    /// Anything else.
    Other,
}

impl<'a> InboundEvent<'a> {
    /// Classify `msg` as seen by a client currently named `own_nick`.
    pub fn classify(msg: &MessageRef<'a>, own_nick: &str) -> Self {
        if let Some(code) = msg.numeric() {
            return Self::classify_numeric(msg, code);
        }

        match msg.command().to_ascii_uppercase().as_str() {
            "PING" => Self::Ping {
                token: msg.trailing(),
            },
            "PONG" => Self::Pong,
            "CAP" => match msg.arg(1).map(str::to_ascii_uppercase).as_deref() {
                Some("ACK") => Self::CapAck {
                    caps: msg.arg(2).unwrap_or("").trim(),
                },
                Some("NAK") => Self::CapNak {
                    caps: msg.arg(2).unwrap_or("").trim(),
                },
                _ => Self::Other,
            },
            "AUTHENTICATE" => Self::AuthChallenge {
                data: msg.arg(0).unwrap_or(""),
            },
            "MODE" => {
                let from_self = msg.source_nickname().is_some_and(|n| irc_eq(n, own_nick));
                let for_self = msg.arg(0).is_some_and(|t| irc_eq(t, own_nick));
                if from_self || for_self {
                    Self::OwnMode
                } else {
                    Self::Other
                }
            }
            "PRIVMSG" => match (msg.arg(0), msg.arg(1)) {
                (Some(target), Some(text)) => Self::Targeted {
                    sender: msg.prefix.map(|p| p.name).unwrap_or(""),
                    target,
                    text,
                },
                _ => Self::Other,
            },
            "ERROR" => Self::ServerError {
                reason: msg.trailing().unwrap_or(""),
            },
            _ => Self::Other,
        }
    }

    fn classify_numeric(msg: &MessageRef<'a>, code: u16) -> Self {
        match code {
            1 => Self::Welcome,
            433 => Self::NickInUse {
                nick: msg.arg(1).unwrap_or(""),
            },
            900 => Self::Sasl(SaslOutcome::LoggedIn),
            903 => Self::Sasl(SaslOutcome::Success),
            902 | 904..=907 => Self::Sasl(SaslOutcome::Failed(code)),
            _ => Self::Other,
        }
    }

    /// True for lines that prove the server is alive and answering us.
    pub fn is_keepalive_reply(&self) -> bool {
        matches!(self, Self::Pong)
    }
}
