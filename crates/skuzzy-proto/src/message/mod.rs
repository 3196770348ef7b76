//! Borrowed IRC message type.

mod parser;

use std::fmt::{self, Display, Formatter};

use crate::error::MessageParseError;
use crate::prefix::PrefixRef;

use parser::{parse_line, Params};

/// A parsed inbound line borrowing from the original string.
///
/// ```
/// use skuzzy_proto::MessageRef;
///
/// let msg = MessageRef::parse(":nick!user@host PRIVMSG #channel :Hello!").unwrap();
/// assert_eq!(msg.command(), "PRIVMSG");
/// assert_eq!(msg.arg(1), Some("Hello!"));
/// assert_eq!(msg.source_nickname(), Some("nick"));
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct MessageRef<'a> {
    /// Raw IRCv3 tags (without the leading `@`).
    pub tags: Option<&'a str>,
    /// Message origin, if present.
    pub prefix: Option<PrefixRef<'a>>,
    command: &'a str,
    args: Params<'a>,
    /// The line as received, line terminators removed.
    pub raw: &'a str,
}

impl<'a> MessageRef<'a> {
    /// Parse one line. Trailing `\r`/`\n` and surrounding blanks are ignored.
    pub fn parse(s: &'a str) -> Result<MessageRef<'a>, MessageParseError> {
        let trimmed = s.trim_end_matches(['\r', '\n']).trim();
        if trimmed.is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        let (_, parsed) = parse_line(trimmed).map_err(|_| MessageParseError::InvalidCommand)?;

        Ok(MessageRef {
            tags: parsed.tags,
            prefix: parsed.prefix.map(PrefixRef::parse),
            command: parsed.command,
            args: parsed.params,
            raw: trimmed,
        })
    }

    /// Command verb or three-digit numeric, as sent.
    #[inline]
    pub fn command(&self) -> &'a str {
        self.command
    }

    /// True when the command matches `name` ignoring ASCII case.
    #[inline]
    pub fn is(&self, name: &str) -> bool {
        self.command.eq_ignore_ascii_case(name)
    }

    /// Numeric reply code, if the command is a numeric.
    pub fn numeric(&self) -> Option<u16> {
        if self.command.len() == 3 {
            self.command.parse().ok()
        } else {
            None
        }
    }

    /// All parameters, trailing included.
    #[inline]
    pub fn args(&self) -> &[&'a str] {
        &self.args
    }

    /// Parameter at `index`.
    #[inline]
    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).copied()
    }

    /// Last parameter (usually the trailing text).
    #[inline]
    pub fn trailing(&self) -> Option<&'a str> {
        self.args.last().copied()
    }

    /// Nickname of the sender, if the prefix names a user.
    pub fn source_nickname(&self) -> Option<&'a str> {
        self.prefix.as_ref().and_then(|p| p.nickname())
    }

    /// Value of the tag `key`, if present.
    pub fn tag_value(&self, key: &str) -> Option<&'a str> {
        self.tags?
            .split(';')
            .map(|tag| tag.split_once('=').unwrap_or((tag, "")))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

impl Display for MessageRef<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_blank_lines() {
        assert_eq!(
            MessageRef::parse("\r\n"),
            Err(MessageParseError::EmptyMessage)
        );
        assert_eq!(MessageRef::parse("   "), Err(MessageParseError::EmptyMessage));
    }

    #[test]
    fn parse_strips_terminators() {
        let msg = MessageRef::parse("PING :irc.example.net\r\n").unwrap();
        assert_eq!(msg.command(), "PING");
        assert_eq!(msg.trailing(), Some("irc.example.net"));
        assert_eq!(msg.raw, "PING :irc.example.net");
    }

    #[test]
    fn numeric_is_detected() {
        let msg = MessageRef::parse(":srv 433 * skuzzy :Nickname is already in use").unwrap();
        assert_eq!(msg.numeric(), Some(433));
        let msg = MessageRef::parse("PING x").unwrap();
        assert_eq!(msg.numeric(), None);
    }

    #[test]
    fn command_match_is_case_insensitive() {
        let msg = MessageRef::parse("privmsg #a :b").unwrap();
        assert!(msg.is("PRIVMSG"));
    }

    #[test]
    fn tag_lookup() {
        let msg = MessageRef::parse("@account=bob;bot :b PRIVMSG #x :y").unwrap();
        assert_eq!(msg.tag_value("account"), Some("bob"));
        assert_eq!(msg.tag_value("bot"), Some(""));
        assert_eq!(msg.tag_value("time"), None);
    }

    #[test]
    fn display_round_trips_raw() {
        let msg = MessageRef::parse(":a!b@c JOIN #d").unwrap();
        assert_eq!(msg.to_string(), ":a!b@c JOIN #d");
    }
}
