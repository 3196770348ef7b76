//! Events handed to feature collaborators.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Which collaborator an event is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Chat-completion relay.
    ChatRelay,
    /// Reminder-intent parsing.
    ReminderIntent,
    /// Challenge-answer checking.
    ChallengeAnswer,
    /// Preference parsing from private messages.
    Preference,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 4] = [
        Self::ChatRelay,
        Self::ReminderIntent,
        Self::ChallengeAnswer,
        Self::Preference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChatRelay => "chat_relay",
            Self::ReminderIntent => "reminder_intent",
            Self::ChallengeAnswer => "challenge_answer",
            Self::Preference => "preference",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification flags computed by the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageFlags {
    /// Text starts with the bot's nickname.
    pub mentioned: bool,
    /// Text mentions a reminder.
    pub reminder_intent: bool,
    /// `@reset` marker was present.
    pub reset: bool,
    /// `@reload` marker was present.
    pub reload: bool,
    /// Sent directly to the bot rather than to a channel.
    pub private: bool,
    /// A bridge `<user> ` prefix was stripped.
    pub relayed: bool,
}

/// One decoded message for a collaborator.
#[derive(Debug, Clone)]
pub struct FeatureEvent {
    pub server: String,
    /// `None` for private messages.
    pub channel: Option<String>,
    /// Sender nickname.
    pub user: String,
    /// Text with markers and bridge prefix removed.
    pub text: String,
    /// Text as received.
    pub raw: String,
    pub flags: MessageFlags,
    /// Channel backlog at the time of the message, oldest first. Empty for
    /// private messages.
    pub backlog: Arc<[String]>,
    /// Language model configured for the channel.
    pub llm: Option<String>,
    /// Prompt names enabled for the channel.
    pub prompts: Arc<[String]>,
    pub received_at: DateTime<Utc>,
}

impl FeatureEvent {
    /// Where a reply should go: the channel, or the sender for private
    /// messages.
    pub fn reply_target(&self) -> &str {
        self.channel.as_deref().unwrap_or(&self.user)
    }
}
