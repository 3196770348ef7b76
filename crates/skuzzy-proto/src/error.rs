//! Error types for the protocol crate.
//!
//! [`ProtocolError`] covers the byte-stream side and
//! [`MessageParseError`] covers turning one framed line into a message.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Errors raised while framing or decoding the inbound byte stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while parsing a single line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageParseError {
    /// The line was empty (or only whitespace / line terminators).
    #[error("empty message")]
    EmptyMessage,

    /// No valid command token could be found.
    #[error("invalid command")]
    InvalidCommand,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: ProtocolError = io.into();
        assert!(matches!(err, ProtocolError::Io(_)));
    }

    #[test]
    fn parse_error_display() {
        assert_eq!(MessageParseError::EmptyMessage.to_string(), "empty message");
        assert_eq!(
            MessageParseError::InvalidCommand.to_string(),
            "invalid command"
        );
    }
}
