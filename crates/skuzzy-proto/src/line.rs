//! Newline framing for the inbound byte stream.
//!
//! A socket read can end anywhere, including in the middle of a line or a
//! multi-byte character. [`LineFramer`] keeps the unterminated tail in the
//! read buffer and completes it on the next read, so a line split across
//! reads is delivered exactly once and intact.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error;

/// Upper bound on a buffered line before it is discarded.
pub const DEFAULT_MAX_LINE_LEN: usize = 8192;

/// Carry-over line codec.
///
/// Yields each line without its `\n` and optional `\r`. Empty lines are
/// yielded too; callers skip them at parse time. Bytes that are not valid
/// UTF-8 are replaced rather than failing the stream.
#[derive(Debug)]
pub struct LineFramer {
    /// Index of the next byte to scan for a newline.
    next_index: usize,
    max_len: usize,
    /// Inside an over-long line; drop bytes until the next newline.
    discarding: bool,
    dropped: u64,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    /// Framer with the default line limit.
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Framer that discards lines longer than `max_len` bytes.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
            dropped: 0,
        }
    }

    /// Number of over-long lines discarded so far.
    pub fn dropped_lines(&self) -> u64 {
        self.dropped
    }

    /// Append one read's worth of bytes and drain every completed line.
    pub fn feed(&mut self, buf: &mut BytesMut, chunk: &[u8]) -> Vec<String> {
        buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Ok(Some(line)) = self.decode(buf) {
            lines.push(line);
        }
        lines
    }

    fn to_text(line: &[u8]) -> String {
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        String::from_utf8_lossy(line).into_owned()
    }

    fn drop_line(&mut self, len: usize) {
        self.dropped += 1;
        tracing::warn!(len, limit = self.max_len, "discarding over-long inbound line");
    }
}

impl Decoder for LineFramer {
    type Item = String;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                if src.len() > self.max_len {
                    if !self.discarding {
                        self.drop_line(src.len());
                        self.discarding = true;
                    }
                    src.clear();
                    self.next_index = 0;
                } else {
                    self.next_index = src.len();
                }
                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if self.discarding {
                self.discarding = false;
                continue;
            }
            if line.len() > self.max_len {
                self.drop_line(line.len());
                continue;
            }
            return Ok(Some(Self::to_text(&line)));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        self.next_index = 0;
        if src.is_empty() || self.discarding {
            src.clear();
            self.discarding = false;
            return Ok(None);
        }
        let rest = src.split();
        Ok(Some(Self::to_text(&rest)))
    }
}

impl Encoder<String> for LineFramer {
    type Error = error::ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> error::Result<()> {
        dst.extend_from_slice(line.as_bytes());
        if !line.ends_with("\r\n") {
            dst.extend_from_slice(b"\r\n");
        }
        Ok(())
    }
}
