//! Text-level classification of targeted messages.

use regex::Regex;

use crate::features::MessageFlags;

/// Bridge bots prefix relayed text with `<name> `.
const RELAY_PREFIX: &str = r"^<[^>]*?> ";
const REMINDER: &str = r"(?i)remind|reminder";
const RESET_MARKER: &str = "@reset";
const RELOAD_MARKER: &str = "@reload";

/// A classified message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// Text after prefix and marker removal.
    pub text: String,
    /// Text after prefix removal only.
    pub unmarked: String,
    pub flags: MessageFlags,
}

/// Compiled patterns, built once per dispatcher.
#[derive(Debug, Clone)]
pub struct Classifier {
    relay_prefix: Regex,
    reminder: Regex,
}

impl Classifier {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            relay_prefix: Regex::new(RELAY_PREFIX)?,
            reminder: Regex::new(REMINDER)?,
        })
    }

    /// Classify `text` received by `own_nick`. `from_relay` allows the
    /// bridge prefix to be stripped.
    pub fn classify(&self, own_nick: &str, text: &str, private: bool, from_relay: bool) -> Classified {
        let mut relayed = false;
        let mut unmarked = text;
        if from_relay
            && let Some(m) = self.relay_prefix.find(text)
        {
            unmarked = &text[m.end()..];
            relayed = true;
        }

        let reset = unmarked.contains(RESET_MARKER);
        let reload = unmarked.contains(RELOAD_MARKER);
        let mut cleaned = unmarked.to_string();
        if reset {
            cleaned = cleaned.replace(RESET_MARKER, "");
        }
        if reload {
            cleaned = cleaned.replace(RELOAD_MARKER, "");
        }

        Classified {
            flags: MessageFlags {
                mentioned: is_mention(own_nick, unmarked),
                reminder_intent: self.reminder.is_match(unmarked),
                reset,
                reload,
                private,
                relayed,
            },
            text: cleaned.trim().to_string(),
            unmarked: unmarked.to_string(),
        }
    }
}

/// Text starts with `nick`, ignoring ASCII case.
fn is_mention(nick: &str, text: &str) -> bool {
    !nick.is_empty()
        && text
            .get(..nick.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(nick))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Classified {
        Classifier::new()
            .unwrap()
            .classify("skuzzy", text, false, true)
    }

    #[test]
    fn test_mention_is_prefix_match() {
        assert!(classify("Skuzzy: what time is it").flags.mentioned);
        assert!(!classify("hey skuzzy").flags.mentioned);
        assert!(!classify("sk").flags.mentioned);
    }

    #[test]
    fn test_reminder_intent() {
        assert!(classify("please REMIND me at 5").flags.reminder_intent);
        assert!(classify("set a reminder").flags.reminder_intent);
        assert!(!classify("remain calm").flags.reminder_intent);
    }

    #[test]
    fn test_markers_are_stripped() {
        let c = classify("skuzzy @reset tell me a joke @reload");
        assert!(c.flags.reset);
        assert!(c.flags.reload);
        assert_eq!(c.text, "skuzzy  tell me a joke");
        assert_eq!(c.unmarked, "skuzzy @reset tell me a joke @reload");
    }

    #[test]
    fn test_relay_prefix() {
        let c = classify("<bob> skuzzy: hi");
        assert!(c.flags.relayed);
        assert!(c.flags.mentioned);
        assert_eq!(c.text, "skuzzy: hi");

        let c = Classifier::new()
            .unwrap()
            .classify("skuzzy", "<bob> hi", false, false);
        assert!(!c.flags.relayed);
        assert_eq!(c.text, "<bob> hi");
    }

    #[test]
    fn test_private_flag_passes_through() {
        let c = Classifier::new().unwrap().classify("skuzzy", "hi", true, false);
        assert!(c.flags.private);
    }

    #[test]
    fn test_multibyte_text_near_nick_length() {
        assert!(!classify("ééé").flags.mentioned);
    }
}
