//! The collaborator boundary.

use async_trait::async_trait;
use tracing::info;

use super::event::FeatureEvent;
use crate::network::Outbound;

/// A feature collaborator.
///
/// Handlers run on their own task, one event at a time. They may send
/// through `out` as often as they like and read the event's backlog
/// snapshot; they never see the live backlog or a raw socket.
#[async_trait]
pub trait FeatureHandler: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Process one event.
    async fn handle(&self, event: FeatureEvent, out: &Outbound);
}

/// Logs every event and replies to nothing. Installed for each queue that
/// has no real collaborator attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

#[async_trait]
impl FeatureHandler for LoggingHandler {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn handle(&self, event: FeatureEvent, _out: &Outbound) {
        info!(
            server = %event.server,
            target = %event.reply_target(),
            user = %event.user,
            mentioned = event.flags.mentioned,
            backlog = event.backlog.len(),
            "feature event: {}",
            event.text
        );
    }
}
