//! # skuzzy-proto
//!
//! The protocol half of the skuzzy IRC bot: everything that can be expressed
//! without touching a socket.
//!
//! ## Features
//!
//! - Zero-copy parsing of inbound lines into [`MessageRef`]
//! - A carry-over [`LineFramer`] that reassembles lines split across reads
//! - An [`OutboundEncoder`] that sanitizes, truncates and fragments chat text
//! - SASL PLAIN encoding and nickname collision handling
//! - A sans-IO [`SessionMachine`] driving CAP, SASL, registration and joins
//!
//! ## Quick Start
//!
//! ```rust
//! use skuzzy_proto::{InboundEvent, MessageRef};
//!
//! let msg = MessageRef::parse(":alice!a@host PRIVMSG #rust :hello").unwrap();
//! let event = InboundEvent::classify(&msg, "skuzzy");
//! assert!(matches!(event, InboundEvent::Targeted { .. }));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod encode;
pub mod error;
pub mod event;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod names;
pub mod prefix;
pub mod sasl;
pub mod state;

pub use self::encode::{EncodedFrame, OutboundEncoder, ELLIPSIS, MAX_FRAGMENT_LEN, MAX_TOTAL_LEN};
pub use self::error::{MessageParseError, ProtocolError};
pub use self::event::{InboundEvent, SaslOutcome};
#[cfg(feature = "tokio")]
pub use self::line::{LineFramer, DEFAULT_MAX_LINE_LEN};
pub use self::message::MessageRef;
pub use self::names::{irc_eq, is_channel_name, next_collision_nick, NickExt, DEFAULT_NICK_MAX_LEN};
pub use self::prefix::PrefixRef;
pub use self::sasl::encode_plain;
pub use self::state::{
    Action, Phase, SaslCredentials, SessionConfig, SessionMachine, TerminalReason,
};
