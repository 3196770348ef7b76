//! Supervised feature workers.
//!
//! Each worker drains its own queue. Every event is handled on a fresh
//! task so a panicking handler loses that one event; the worker logs it and
//! moves on to the next. Dispatch never waits on a worker.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, Instrument};

use super::event::{FeatureEvent, FeatureKind};
use super::handler::FeatureHandler;
use crate::network::Outbound;
use crate::telemetry::spans;

/// Spawns and owns the worker tasks.
pub struct WorkerHost {
    outbound: Outbound,
    shutdown: CancellationToken,
    workers: Vec<JoinHandle<u64>>,
}

impl WorkerHost {
    pub fn new(outbound: Outbound, shutdown: CancellationToken) -> Self {
        Self {
            outbound,
            shutdown,
            workers: Vec::new(),
        }
    }

    /// Start a worker for `kind`.
    pub fn spawn(
        &mut self,
        kind: FeatureKind,
        handler: Arc<dyn FeatureHandler>,
        rx: mpsc::Receiver<FeatureEvent>,
    ) {
        let task = run_worker(
            kind,
            handler,
            rx,
            self.outbound.clone(),
            self.shutdown.clone(),
        )
        .instrument(spans::worker(kind.as_str()));
        self.workers.push(tokio::spawn(task));
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Wait for every worker to stop. Returns the total number of handler
    /// panics survived.
    pub async fn join(self) -> u64 {
        let mut panics = 0;
        for worker in self.workers {
            match worker.await {
                Ok(n) => panics += n,
                Err(e) => error!(error = %e, "feature worker task failed"),
            }
        }
        panics
    }
}

/// Worker loop. Returns the number of handler panics.
async fn run_worker(
    kind: FeatureKind,
    handler: Arc<dyn FeatureHandler>,
    mut rx: mpsc::Receiver<FeatureEvent>,
    outbound: Outbound,
    shutdown: CancellationToken,
) -> u64 {
    let mut panics = 0;
    debug!(handler = handler.name(), "feature worker started");

    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        let handler = Arc::clone(&handler);
        let out = outbound.clone();
        let task = tokio::spawn(async move { handler.handle(event, &out).await });
        if let Err(e) = task.await {
            if e.is_panic() {
                panics += 1;
                error!(kind = %kind, panics, "feature handler panicked, restarting");
            } else {
                debug!(kind = %kind, "feature handler cancelled");
            }
        }
    }

    debug!(kind = %kind, "feature worker stopped");
    panics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureQueues, MessageFlags};
    use crate::network::ConnectionRegistry;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;

    struct Recorder {
        seen: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl FeatureHandler for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn handle(&self, event: FeatureEvent, _out: &Outbound) {
            if event.text == "boom" {
                panic!("handler blew up");
            }
            let _ = self.seen.send(event.text);
        }
    }

    fn event(text: &str) -> FeatureEvent {
        FeatureEvent {
            server: "libera".into(),
            channel: Some("#rust".into()),
            user: "alice".into(),
            text: text.into(),
            raw: text.into(),
            flags: MessageFlags::default(),
            backlog: Arc::from(Vec::new()),
            llm: None,
            prompts: Arc::from(Vec::new()),
            received_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_worker_survives_panicking_handler() {
        let shutdown = CancellationToken::new();
        let outbound = Outbound::new(Arc::new(ConnectionRegistry::new()), Duration::ZERO);
        let mut host = WorkerHost::new(outbound, shutdown.clone());

        let (queues, rx) = FeatureQueues::new(8);
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        host.spawn(
            FeatureKind::ChatRelay,
            Arc::new(Recorder { seen: seen_tx }),
            rx.chat_relay,
        );
        assert_eq!(host.len(), 1);

        assert!(queues.try_enqueue(FeatureKind::ChatRelay, event("one")));
        assert!(queues.try_enqueue(FeatureKind::ChatRelay, event("boom")));
        assert!(queues.try_enqueue(FeatureKind::ChatRelay, event("two")));

        assert_eq!(seen_rx.recv().await.unwrap(), "one");
        assert_eq!(seen_rx.recv().await.unwrap(), "two");

        shutdown.cancel();
        assert_eq!(host.join().await, 1);
    }

    #[tokio::test]
    async fn test_worker_stops_when_queue_closes() {
        let outbound = Outbound::new(Arc::new(ConnectionRegistry::new()), Duration::ZERO);
        let mut host = WorkerHost::new(outbound, CancellationToken::new());
        let (queues, rx) = FeatureQueues::new(1);
        host.spawn(
            FeatureKind::Preference,
            Arc::new(crate::features::LoggingHandler),
            rx.preference,
        );
        drop(queues);
        assert_eq!(host.join().await, 0);
    }
}
