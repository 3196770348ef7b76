//! Routing of targeted messages to feature queues.
//!
//! The session driver classifies protocol lines itself; anything that turns
//! out to be a `PRIVMSG` lands here. The dispatcher resolves the target to a
//! configured channel or to a private message, records channel lines in the
//! backlog, computes [`MessageFlags`](crate::features::MessageFlags) and
//! enqueues onto the feature queues without ever blocking.

mod backlog;
mod flags;

pub use backlog::{Backlog, BACKLOG_CAPACITY};
pub use flags::{Classified, Classifier};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use skuzzy_proto::irc_eq;
use skuzzy_proto::names::irc_to_lower;
use tracing::debug;

use crate::config::ServerConfig;
use crate::control::ControlState;
use crate::features::{FeatureEvent, FeatureKind, FeatureQueues};

/// Where a message went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Message on a configured channel, enqueued on `queued`.
    Channel {
        channel: String,
        queued: Vec<FeatureKind>,
    },
    /// Message addressed to the bot.
    Private { queued: bool },
    /// Unknown target.
    Ignored,
}

/// Per-server dispatcher. Lives across reconnects, so backlogs survive them.
pub struct Dispatcher {
    config: Arc<ServerConfig>,
    classifier: Classifier,
    backlogs: HashMap<String, Backlog>,
    queues: FeatureQueues,
    control: Option<Arc<ControlState>>,
}

impl Dispatcher {
    pub fn new(config: Arc<ServerConfig>, queues: FeatureQueues) -> Result<Self, regex::Error> {
        Ok(Self {
            config,
            classifier: Classifier::new()?,
            backlogs: HashMap::new(),
            queues,
            control: None,
        })
    }

    /// Echo channel traffic to the control socket when it asks for it.
    pub fn with_control(mut self, control: Arc<ControlState>) -> Self {
        self.control = Some(control);
        self
    }

    /// Snapshot of a channel's backlog.
    pub fn backlog(&self, channel: &str) -> Option<Arc<[String]>> {
        self.backlogs.get(&irc_to_lower(channel)).map(Backlog::snapshot)
    }

    /// Route one `PRIVMSG` from `sender` to `target`.
    pub fn dispatch(&mut self, own_nick: &str, sender: &str, target: &str, text: &str) -> Route {
        let sender = sender.split('!').next().unwrap_or(sender);
        let from_relay = self.config.is_relay(sender);

        if irc_eq(target, own_nick) {
            let classified = self.classifier.classify(own_nick, text, true, from_relay);
            let event = FeatureEvent {
                server: self.config.name.clone(),
                channel: None,
                user: sender.to_string(),
                text: classified.text,
                raw: text.to_string(),
                flags: classified.flags,
                backlog: Arc::from(Vec::new()),
                llm: None,
                prompts: Arc::from(Vec::new()),
                received_at: Utc::now(),
            };
            let queued = self.queues.try_enqueue(FeatureKind::Preference, event);
            return Route::Private { queued };
        }

        let Some(channel) = self.config.channel(target) else {
            debug!(server = %self.config.name, target = %target, "message for unknown target");
            return Route::Ignored;
        };

        let classified = self.classifier.classify(own_nick, text, false, from_relay);

        // Backlog first, whatever happens to the message afterwards.
        let backlog = self.backlogs.entry(irc_to_lower(&channel.name)).or_default();
        backlog.push(format!("<{sender}> {}", classified.unmarked));
        let snapshot = backlog.snapshot();

        if let Some(control) = &self.control {
            control.offer_echo(&self.config.name, &channel.name, sender, &classified.unmarked);
        }

        let mut kinds = Vec::new();
        if channel.llm.is_some() {
            kinds.push(if classified.flags.reminder_intent {
                FeatureKind::ReminderIntent
            } else {
                FeatureKind::ChatRelay
            });
        }
        if channel.challenge {
            kinds.push(FeatureKind::ChallengeAnswer);
        }

        let event = FeatureEvent {
            server: self.config.name.clone(),
            channel: Some(channel.name.clone()),
            user: sender.to_string(),
            text: classified.text,
            raw: text.to_string(),
            flags: classified.flags,
            backlog: snapshot,
            llm: channel.llm.clone(),
            prompts: channel.prompts.iter().cloned().collect(),
            received_at: Utc::now(),
        };

        let queued = kinds
            .into_iter()
            .filter(|kind| self.queues.try_enqueue(*kind, event.clone()))
            .collect();

        Route::Channel {
            channel: channel.name.clone(),
            queued,
        }
    }
}
