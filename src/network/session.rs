//! One connection attempt, from dial to teardown.
//!
//! The driver owns the read half and the [`SessionMachine`]; the write half
//! lives in the registry so features and the control socket can send on
//! it. Whatever ends the attempt, the registry entry this session installed
//! is removed before [`run_session`] returns.

use std::convert::Infallible;
use std::sync::Arc;

use futures_util::StreamExt;
use skuzzy_proto::{Action, InboundEvent, LineFramer, MessageRef, SessionMachine};
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::connection::{Connection, ConnectionId};
use super::registry::ConnectionRegistry;
use super::stream::BotStream;
use super::tls;
use crate::config::ServerConfig;
use crate::dispatch::{Dispatcher, Route};
use crate::error::SessionError;
use crate::telemetry::redact_line;

/// Run one attempt to completion and return why it ended.
pub async fn run_session(
    config: &ServerConfig,
    registry: &ConnectionRegistry,
    dispatcher: &mut Dispatcher,
    shutdown: &CancellationToken,
) -> SessionError {
    let stream = tokio::select! {
        _ = shutdown.cancelled() => return SessionError::Shutdown,
        dialed = dial(config) => match dialed {
            Ok(stream) => stream,
            Err(e) => return e,
        },
    };

    let (reader, writer) = tokio::io::split(stream);
    let conn = Arc::new(Connection::new(config.name.clone(), Box::new(writer)));
    let id = conn.id();
    let closed = conn.closed();
    if let Some(prior) = registry.install(conn) {
        debug!(prior = prior.id(), "replacing stale connection");
        prior.close();
    }
    info!(id, "connected");

    let mut session = Session {
        config,
        registry,
        shutdown,
        id,
    };
    let Err(reason) = session
        .drive(FramedRead::new(reader, LineFramer::new()), dispatcher, &closed)
        .await;

    registry.remove_connection(&config.name, id);
    reason
}

/// TCP connect, then TLS if configured, both under one connect deadline.
async fn dial(config: &ServerConfig) -> Result<BotStream, SessionError> {
    let addr = config.address();
    let deadline = Instant::now() + config.timing.connect_timeout();
    let tcp = match timeout_at(deadline, TcpStream::connect(&addr)).await {
        Ok(Ok(tcp)) => tcp,
        Ok(Err(source)) => return Err(SessionError::Dial { addr, source }),
        Err(_) => {
            return Err(SessionError::Dial {
                addr,
                source: std::io::ErrorKind::TimedOut.into(),
            });
        }
    };
    if let Err(e) = tcp.set_nodelay(true) {
        debug!(error = %e, "failed to set TCP_NODELAY");
    }

    if !config.tls {
        return Ok(BotStream::Plain(tcp));
    }
    match timeout_at(deadline, tls::upgrade(tcp, &config.host, config.verify_cert)).await {
        Ok(tls) => Ok(BotStream::Tls(Box::new(tls?))),
        Err(_) => Err(SessionError::Tls(std::io::ErrorKind::TimedOut.into())),
    }
}

struct Session<'a> {
    config: &'a ServerConfig,
    registry: &'a ConnectionRegistry,
    shutdown: &'a CancellationToken,
    id: ConnectionId,
}

impl Session<'_> {
    async fn drive<R>(
        &mut self,
        mut lines: FramedRead<R, LineFramer>,
        dispatcher: &mut Dispatcher,
        closed: &CancellationToken,
    ) -> Result<Infallible, SessionError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut machine = SessionMachine::new(self.config.session_config());
        self.apply(machine.start()).await?;
        let read_timeout = self.config.timing.read_timeout();

        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Err(SessionError::Shutdown),
                _ = closed.cancelled() => return Err(SessionError::Cancelled),
                next = timeout(read_timeout, lines.next()) => next,
            };

            let line = match next {
                Err(_) => {
                    debug!(phase = machine.phase().as_str(), "read timed out");
                    self.apply(machine.on_read_timeout()).await?;
                    continue;
                }
                Ok(None) => return Err(SessionError::ConnectionClosed),
                Ok(Some(Err(e))) => return Err(e.into()),
                Ok(Some(Ok(line))) => line,
            };

            debug!("> {}", line);
            if line.trim().is_empty() {
                continue;
            }
            machine.on_activity();

            let msg = match MessageRef::parse(&line) {
                Ok(msg) => msg,
                Err(e) => {
                    debug!(error = %e, "skipping unparsable line");
                    continue;
                }
            };
            let event = InboundEvent::classify(&msg, machine.nick());

            if event.is_keepalive_reply()
                && let Some(conn) = self.registry.lookup_id(&self.config.name, self.id)
            {
                conn.touch_keepalive();
            }

            let actions = machine.handle(&event);
            self.apply(actions).await?;

            if let InboundEvent::Targeted {
                sender,
                target,
                text,
            } = event
            {
                let route = dispatcher.dispatch(machine.nick(), sender, target, text);
                if !matches!(route, Route::Ignored) {
                    debug!(?route, "dispatched");
                }
            }
        }
    }

    async fn apply(&self, actions: Vec<Action>) -> Result<(), SessionError> {
        for action in actions {
            match action {
                Action::Send(line) => {
                    debug!("< {}", line);
                    self.write(&line).await?;
                }
                Action::SendSecret(line) => {
                    debug!("< {}", redact_line(&line));
                    self.write(&line).await?;
                }
                Action::Ready => info!("registered and joined"),
                Action::Terminate(reason) => {
                    warn!(reason = %reason, "session terminated by protocol");
                    return Err(reason.into());
                }
            }
        }
        Ok(())
    }

    /// Write on our own registry entry. A write that cannot finish within
    /// the read timeout ends the attempt, so a peer that stops reading never
    /// stalls the read loop.
    async fn write(&self, line: &str) -> Result<(), SessionError> {
        let conn = self
            .registry
            .lookup_id(&self.config.name, self.id)
            .ok_or(SessionError::Cancelled)?;
        let deadline = self.config.timing.read_timeout();
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(SessionError::Shutdown),
            written = timeout(deadline, conn.write_line(line)) => match written {
                Ok(Ok(())) => Ok(()),
                Ok(Err(_)) if conn.is_closed() => Err(SessionError::Cancelled),
                Ok(Err(e)) => Err(e.into()),
                Err(_) => Err(SessionError::Io(std::io::ErrorKind::TimedOut.into())),
            },
        }
    }
}
