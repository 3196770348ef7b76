//! "Send this text to that target" for every producer.
//!
//! [`Outbound`] is the handle feature workers, the control socket and the
//! dispatcher use to talk. Each fragment re-resolves the connection through
//! the registry, so a reconnect between fragments is picked up and a worker
//! never keeps a socket across a suspension point.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use skuzzy_proto::OutboundEncoder;
use tracing::debug;

use super::registry::ConnectionRegistry;
use crate::error::RegistryError;

/// Cloneable sending handle.
#[derive(Clone)]
pub struct Outbound {
    registry: Arc<ConnectionRegistry>,
    encoder: OutboundEncoder,
    pacing: Arc<HashMap<String, Duration>>,
    default_pacing: Duration,
}

impl Outbound {
    /// Handle over `registry` with the same `default_pacing` between
    /// fragments on every server.
    pub fn new(registry: Arc<ConnectionRegistry>, default_pacing: Duration) -> Self {
        Self {
            registry,
            encoder: OutboundEncoder::new(),
            pacing: Arc::new(HashMap::new()),
            default_pacing,
        }
    }

    /// Per-server pacing overrides.
    pub fn with_pacing(mut self, pacing: HashMap<String, Duration>) -> Self {
        self.pacing = Arc::new(pacing);
        self
    }

    /// Replace the default fragment limits.
    pub fn with_encoder(mut self, encoder: OutboundEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// The registry this handle sends through.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    fn pacing_for(&self, server: &str) -> Duration {
        self.pacing
            .get(server)
            .copied()
            .unwrap_or(self.default_pacing)
    }

    /// Send `text` to `target` on `server`. Long text becomes a paced chain
    /// of continuation fragments. An empty target sends a bare line.
    pub async fn say(&self, server: &str, target: &str, text: &str) -> Result<(), RegistryError> {
        let pacing = self.pacing_for(server);
        let mut next = Some(text.to_string());
        let mut first = true;
        while let Some(text) = next.take() {
            if !first {
                tokio::time::sleep(pacing).await;
            }
            first = false;
            let frame = self.encoder.encode(target, &text);
            self.registry.send_line(server, &frame.line).await?;
            if let Some(rest) = frame.continuation {
                debug!(server = %server, target = %target, remaining = rest.chars().count(), "continuation queued");
                next = Some(rest);
            }
        }
        Ok(())
    }

    /// Send several texts to one target with pacing between them, for
    /// multi-line output such as help text.
    pub async fn say_lines<I, S>(&self, server: &str, target: &str, lines: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pacing = self.pacing_for(server);
        for (i, line) in lines.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(pacing).await;
            }
            self.say(server, target, line.as_ref()).await?;
        }
        Ok(())
    }

    /// Send one protocol line as-is.
    pub async fn raw(&self, server: &str, line: &str) -> Result<(), RegistryError> {
        self.say(server, "", line).await
    }
}
