//! Outbound text framing.
//!
//! Feature code asks to "say this text to that target"; the encoder turns
//! that into protocol-safe lines. Text is sanitized, hard-truncated to
//! [`MAX_TOTAL_LEN`] characters, and cut into a head of at most
//! [`MAX_FRAGMENT_LEN`] bytes. When a cut happens the head gets a
//! trailing [`ELLIPSIS`] and the remainder comes back, prefixed with an
//! ellipsis, as a continuation to be pushed through the encoder again.
//!
//! The fragment cap is in bytes so every line stays inside the 512-byte
//! protocol limit whatever the script. Cuts never split a character.

/// Body cap for one frame, in bytes; the trailing ellipsis is added on top.
pub const MAX_FRAGMENT_LEN: usize = 397;

/// Hard cap on the text accepted by a single encode call.
pub const MAX_TOTAL_LEN: usize = 1600;

/// Marker appended to a cut head and prepended to its continuation.
pub const ELLIPSIS: &str = "...";

/// Ellipsis plus the widest UTF-8 character.
const MIN_FRAGMENT_LEN: usize = ELLIPSIS.len() + 4;

/// Characters that would break line framing.
const STRIPPED: [char; 3] = ['\r', '\n', '\u{8}'];

/// One encoded line plus whatever text did not fit in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    /// Wire line, without the trailing CRLF.
    pub line: String,
    /// The visible text carried by `line`.
    pub payload: String,
    /// Remainder to re-submit, already carrying its leading ellipsis.
    pub continuation: Option<String>,
}

/// Sanitizing, length-bounded PRIVMSG builder.
#[derive(Debug, Clone, Copy)]
pub struct OutboundEncoder {
    max_fragment: usize,
    max_total: usize,
}

impl Default for OutboundEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl OutboundEncoder {
    /// Encoder with the reference limits (397 / 1600).
    pub const fn new() -> Self {
        Self {
            max_fragment: MAX_FRAGMENT_LEN,
            max_total: MAX_TOTAL_LEN,
        }
    }

    /// Encoder with custom limits. `max_fragment` must fit the ellipsis plus
    /// one character of any width or continuations would never shrink;
    /// smaller values are raised.
    pub fn with_limits(max_fragment: usize, max_total: usize) -> Self {
        Self {
            max_fragment: max_fragment.max(MIN_FRAGMENT_LEN),
            max_total,
        }
    }

    /// Body cap per frame, in bytes.
    pub fn max_fragment(&self) -> usize {
        self.max_fragment
    }

    /// Remove CR, LF and backspace.
    pub fn sanitize(text: &str) -> String {
        text.chars().filter(|c| !STRIPPED.contains(c)).collect()
    }

    /// Encode the first frame for `target`. An empty target sends the text
    /// as a bare protocol line.
    pub fn encode(&self, target: &str, text: &str) -> EncodedFrame {
        let clean = Self::sanitize(text);
        let clean = truncate_chars(&clean, self.max_total);

        let (payload, continuation) = match fragment_cut(clean, self.max_fragment) {
            Some(cut) => (
                format!("{}{ELLIPSIS}", &clean[..cut]),
                Some(format!("{ELLIPSIS}{}", &clean[cut..])),
            ),
            None => (clean.to_string(), None),
        };

        let line = if target.is_empty() {
            payload.clone()
        } else {
            format!("PRIVMSG {target} :{payload}")
        };

        EncodedFrame {
            line,
            payload,
            continuation,
        }
    }

    /// Follow the continuation chain to the end and return every wire line.
    pub fn encode_all(&self, target: &str, text: &str) -> Vec<String> {
        self.frames(target, text).into_iter().map(|f| f.line).collect()
    }

    /// Like [`encode_all`](Self::encode_all) but keeps frame metadata.
    pub fn frames(&self, target: &str, text: &str) -> Vec<EncodedFrame> {
        let mut frames = Vec::new();
        let mut next = Some(text.to_string());
        while let Some(text) = next.take() {
            let frame = self.encode(target, &text);
            next = frame.continuation.clone();
            frames.push(frame);
        }
        frames
    }
}

/// Last char boundary at or below `max` bytes, or `None` if the whole text
/// fits.
fn fragment_cut(s: &str, max: usize) -> Option<usize> {
    if s.len() <= max {
        return None;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    Some(cut)
}

/// Byte offset of the `n`th character, or `None` if the text is not longer
/// than `n` characters.
fn byte_offset(s: &str, n: usize) -> Option<usize> {
    s.char_indices().nth(n).map(|(i, _)| i)
}

fn truncate_chars(s: &str, n: usize) -> &str {
    match byte_offset(s, n) {
        Some(cut) => &s[..cut],
        None => s,
    }
}
