//! Bounded per-feature input queues.
//!
//! The dispatcher only ever uses `try_send`: a full queue drops the event
//! with a warning instead of stalling the read loop.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::event::{FeatureEvent, FeatureKind};

/// Sending side, cloned into every dispatcher.
#[derive(Debug, Clone)]
pub struct FeatureQueues {
    chat_relay: mpsc::Sender<FeatureEvent>,
    reminder_intent: mpsc::Sender<FeatureEvent>,
    challenge_answer: mpsc::Sender<FeatureEvent>,
    preference: mpsc::Sender<FeatureEvent>,
}

/// Receiving side, handed to the worker host.
#[derive(Debug)]
pub struct FeatureReceivers {
    pub chat_relay: mpsc::Receiver<FeatureEvent>,
    pub reminder_intent: mpsc::Receiver<FeatureEvent>,
    pub challenge_answer: mpsc::Receiver<FeatureEvent>,
    pub preference: mpsc::Receiver<FeatureEvent>,
}

impl FeatureQueues {
    /// Four queues of `capacity` events each.
    pub fn new(capacity: usize) -> (Self, FeatureReceivers) {
        let capacity = capacity.max(1);
        let (chat_tx, chat_rx) = mpsc::channel(capacity);
        let (reminder_tx, reminder_rx) = mpsc::channel(capacity);
        let (challenge_tx, challenge_rx) = mpsc::channel(capacity);
        let (preference_tx, preference_rx) = mpsc::channel(capacity);
        (
            Self {
                chat_relay: chat_tx,
                reminder_intent: reminder_tx,
                challenge_answer: challenge_tx,
                preference: preference_tx,
            },
            FeatureReceivers {
                chat_relay: chat_rx,
                reminder_intent: reminder_rx,
                challenge_answer: challenge_rx,
                preference: preference_rx,
            },
        )
    }

    fn sender(&self, kind: FeatureKind) -> &mpsc::Sender<FeatureEvent> {
        match kind {
            FeatureKind::ChatRelay => &self.chat_relay,
            FeatureKind::ReminderIntent => &self.reminder_intent,
            FeatureKind::ChallengeAnswer => &self.challenge_answer,
            FeatureKind::Preference => &self.preference,
        }
    }

    /// Enqueue without waiting. Returns whether the event was accepted.
    pub fn try_enqueue(&self, kind: FeatureKind, event: FeatureEvent) -> bool {
        match self.sender(kind).try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(kind = %kind, server = %event.server, "feature queue full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(kind = %kind, "feature queue closed");
                false
            }
        }
    }
}

impl FeatureReceivers {
    /// Split into `(kind, receiver)` pairs.
    pub fn into_pairs(self) -> [(FeatureKind, mpsc::Receiver<FeatureEvent>); 4] {
        [
            (FeatureKind::ChatRelay, self.chat_relay),
            (FeatureKind::ReminderIntent, self.reminder_intent),
            (FeatureKind::ChallengeAnswer, self.challenge_answer),
            (FeatureKind::Preference, self.preference),
        ]
    }
}
