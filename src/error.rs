//! Unified error handling for skuzzy.
//!
//! Every session attempt ends with exactly one [`SessionError`]. The
//! supervisor uses [`SessionError::is_fatal_to_attempt`] to decide between
//! retrying and stopping, and [`SessionError::error_code`] for log labels.

use std::io;

use skuzzy_proto::{ProtocolError, TerminalReason};
use thiserror::Error;

// ============================================================================
// Session Errors (one connection attempt)
// ============================================================================

/// Why a session attempt ended.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to connect to {addr}: {source}")]
    Dial {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("TLS handshake failed: {0}")]
    Tls(#[source] io::Error),

    #[error("invalid TLS server name: {0}")]
    InvalidServerName(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("connection closed by server")]
    ConnectionClosed,

    /// The registry entry was removed or replaced under us.
    #[error("connection closed locally")]
    Cancelled,

    #[error(transparent)]
    Protocol(#[from] TerminalReason),

    #[error("shutdown requested")]
    Shutdown,
}

impl SessionError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Dial { .. } => "dial_failed",
            Self::Tls(_) => "tls_failed",
            Self::InvalidServerName(_) => "invalid_server_name",
            Self::Io(e) if e.kind() == io::ErrorKind::TimedOut => "io_timeout",
            Self::Io(_) => "io_error",
            Self::ConnectionClosed => "connection_closed",
            Self::Cancelled => "cancelled",
            Self::Protocol(reason) => match reason {
                TerminalReason::CapRejected(_) => "cap_rejected",
                TerminalReason::AuthRejected(_) => "auth_rejected",
                TerminalReason::NickExhausted(_) => "nick_exhausted",
                TerminalReason::ServerError(_) => "server_error",
                TerminalReason::KeepaliveTimeout(_) => "keepalive_timeout",
            },
            Self::Shutdown => "shutdown",
        }
    }

    /// True when the supervisor should retry after its delay.
    ///
    /// Everything except a requested shutdown ends only the current
    /// attempt.
    pub fn is_fatal_to_attempt(&self) -> bool {
        !matches!(self, Self::Shutdown)
    }
}

impl From<ProtocolError> for SessionError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(e) => Self::Io(e),
            other => Self::Io(io::Error::new(io::ErrorKind::InvalidData, other)),
        }
    }
}

// ============================================================================
// Registry Errors (outbound sends)
// ============================================================================

/// Failure to deliver a line through the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("server {0} is not connected")]
    NotConnected(String),

    #[error("write to {server} failed: {source}")]
    Write {
        server: String,
        #[source]
        source: io::Error,
    },
}

impl RegistryError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotConnected(_) => "not_connected",
            Self::Write { .. } => "write_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SessionError::ConnectionClosed.error_code(), "connection_closed");
        assert_eq!(
            SessionError::Protocol(TerminalReason::AuthRejected(904)).error_code(),
            "auth_rejected"
        );
        assert_eq!(
            SessionError::Io(io::Error::new(io::ErrorKind::TimedOut, "slow")).error_code(),
            "io_timeout"
        );
        assert_eq!(
            RegistryError::NotConnected("libera".into()).error_code(),
            "not_connected"
        );
    }

    #[test]
    fn test_only_shutdown_stops_retries() {
        assert!(SessionError::ConnectionClosed.is_fatal_to_attempt());
        assert!(SessionError::Cancelled.is_fatal_to_attempt());
        assert!(SessionError::Protocol(TerminalReason::KeepaliveTimeout(2)).is_fatal_to_attempt());
        assert!(!SessionError::Shutdown.is_fatal_to_attempt());
    }

    #[test]
    fn test_protocol_error_maps_to_io() {
        let err: SessionError =
            ProtocolError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset")).into();
        assert!(matches!(err, SessionError::Io(ref e) if e.kind() == io::ErrorKind::ConnectionReset));
    }

    #[test]
    fn test_terminal_reason_display_passes_through() {
        let err = SessionError::Protocol(TerminalReason::ServerError("Closing Link".into()));
        assert_eq!(err.to_string(), "server error: Closing Link");
    }
}
