//! Nickname and channel name rules.
//!
//! Validation follows RFC 2812; comparisons use the `rfc1459` case mapping
//! (`[]\~` fold to `{}|^`), which is what most networks advertise.

/// Default maximum nickname length when the server does not say otherwise.
pub const DEFAULT_NICK_MAX_LEN: usize = 30;

/// Nickname validation.
pub trait NickExt {
    /// Valid per RFC 2812 with the default length cap.
    ///
    /// ```
    /// use skuzzy_proto::NickExt;
    ///
    /// assert!("skuzzy".is_valid_nick());
    /// assert!("skuzzy_".is_valid_nick());
    /// assert!(!"9lives".is_valid_nick());
    /// ```
    fn is_valid_nick(&self) -> bool {
        self.is_valid_nick_len(DEFAULT_NICK_MAX_LEN)
    }

    /// Valid per RFC 2812 with a custom length cap.
    fn is_valid_nick_len(&self, max_len: usize) -> bool;
}

#[inline]
fn is_special(c: char) -> bool {
    matches!(c, '[' | ']' | '\\' | '`' | '_' | '^' | '{' | '|' | '}')
}

impl NickExt for str {
    fn is_valid_nick_len(&self, max_len: usize) -> bool {
        if self.is_empty() || self.len() > max_len {
            return false;
        }
        let mut chars = self.chars();
        let first_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || is_special(c));
        first_ok && chars.all(|c| c.is_ascii_alphanumeric() || is_special(c) || c == '-')
    }
}

impl NickExt for String {
    fn is_valid_nick_len(&self, max_len: usize) -> bool {
        self.as_str().is_valid_nick_len(max_len)
    }
}

/// The nickname to try after `current` was reported in use.
///
/// Appends an underscore while that stays within `max_len`. Returns `None`
/// once the cap is reached, so a run of collisions ends after at most
/// `max_len` attempts.
pub fn next_collision_nick(current: &str, max_len: usize) -> Option<String> {
    if current.len() < max_len {
        Some(format!("{current}_"))
    } else {
        None
    }
}

#[inline]
const fn fold(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        'A'..='Z' => (c as u8 + 32) as char,
        _ => c,
    }
}

/// Case-insensitive name comparison under `rfc1459` mapping.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.chars().zip(b.chars()).all(|(x, y)| fold(x) == fold(y))
}

/// Fold a name to its canonical lower-case key.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(fold).collect()
}

/// True for `#` and `&` channel names without spaces, commas or BEL.
pub fn is_channel_name(s: &str) -> bool {
    s.len() > 1
        && s.starts_with(['#', '&'])
        && !s.contains([' ', ',', '\u{7}'])
}
