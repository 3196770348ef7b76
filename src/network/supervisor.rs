//! Per-server reconnect loop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

use super::registry::ConnectionRegistry;
use super::session::run_session;
use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::telemetry::spans;

/// Keeps one server connected until shutdown.
///
/// Attempts are strictly sequential: the next dial starts only after the
/// previous session has removed its registry entry and the reconnect delay
/// has elapsed.
pub struct Supervisor {
    config: Arc<ServerConfig>,
    registry: Arc<ConnectionRegistry>,
    dispatcher: Dispatcher,
    shutdown: CancellationToken,
}

impl Supervisor {
    /// Supervisor for one server; `dispatcher` carries its backlogs across
    /// reconnects.
    pub fn new(
        config: Arc<ServerConfig>,
        registry: Arc<ConnectionRegistry>,
        dispatcher: Dispatcher,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            registry,
            dispatcher,
            shutdown,
        }
    }

    /// Run attempts until shutdown. Returns the number of attempts made.
    pub async fn run(mut self) -> u64 {
        let delay = self.config.timing.reconnect_delay();
        let mut attempt = 0u64;

        loop {
            attempt += 1;
            let reason = run_session(
                &self.config,
                &self.registry,
                &mut self.dispatcher,
                &self.shutdown,
            )
            .instrument(spans::session(attempt))
            .await;

            if !reason.is_fatal_to_attempt() {
                info!(attempts = attempt, "supervisor stopping");
                return attempt;
            }
            warn!(
                attempt,
                code = reason.error_code(),
                error = %reason,
                delay_secs = delay.as_secs(),
                "session ended, reconnecting"
            );

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!(attempts = attempt, "supervisor stopping");
                    return attempt;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
