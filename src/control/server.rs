//! Unix-socket control interface.
//!
//! Line in, lines out, one command at a time per client. While a client has
//! interactive mode on, channel traffic for the selected server and channel
//! is pushed to it between responses.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use super::admin::ReminderAdmin;
use super::command::{ControlCommand, ReminderCommand, HELP};
use super::state::ControlState;
use crate::network::Outbound;
use crate::telemetry::spans;

const MAX_LINE_LEN: usize = 4096;
const ECHO_CAPACITY: usize = 64;
const GREETING: &str = "Connected to skuzzy's bot control interface...";

/// Serves operator commands.
pub struct ControlServer {
    state: Arc<ControlState>,
    outbound: Outbound,
    admin: Arc<dyn ReminderAdmin>,
    servers: Vec<String>,
    shutdown: CancellationToken,
    next_client: AtomicU64,
}

impl ControlServer {
    pub fn new(
        state: Arc<ControlState>,
        outbound: Outbound,
        admin: Arc<dyn ReminderAdmin>,
        servers: Vec<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            state,
            outbound,
            admin,
            servers,
            shutdown,
            next_client: AtomicU64::new(1),
        }
    }

    /// Bind `path`, replacing a stale socket file.
    pub fn bind(path: &Path) -> io::Result<UnixListener> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        UnixListener::bind(path)
    }

    /// Accept clients until shutdown.
    pub async fn run(self: Arc<Self>, listener: UnixListener) {
        info!("control socket listening");
        loop {
            let stream = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => stream,
                    Err(e) => {
                        warn!(error = %e, "control accept failed");
                        continue;
                    }
                },
            };
            let client = self.next_client.fetch_add(1, Ordering::Relaxed);
            let server = Arc::clone(&self);
            tokio::spawn(
                async move {
                    if let Err(e) = server.serve(stream).await {
                        debug!(error = %e, "control client ended with error");
                    }
                }
                .instrument(spans::control(client)),
            );
        }
        info!("control socket closed");
    }

    async fn serve(&self, stream: UnixStream) -> io::Result<()> {
        let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LEN));
        let (echo_tx, mut echo_rx) = mpsc::channel(ECHO_CAPACITY);
        framed.send(GREETING).await.map_err(codec_io)?;
        debug!("control client connected");

        let result = loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break Ok(()),
                Some(echo) = echo_rx.recv() => {
                    if let Err(e) = framed.send(echo).await {
                        break Err(codec_io(e));
                    }
                }
                frame = framed.next() => match frame {
                    Some(Ok(line)) => {
                        let command = ControlCommand::parse(&line);
                        let quit = command == ControlCommand::Quit;
                        let mut failed = None;
                        for response in self.execute(command, &echo_tx).await {
                            if let Err(e) = framed.send(response).await {
                                failed = Some(codec_io(e));
                                break;
                            }
                        }
                        if let Some(e) = failed {
                            break Err(e);
                        }
                        if quit {
                            break Ok(());
                        }
                    }
                    Some(Err(e)) => break Err(codec_io(e)),
                    None => break Ok(()),
                },
            }
        };

        self.state.detach(&echo_tx);
        debug!("control client disconnected");
        result
    }

    /// Run one command and return the response lines.
    pub async fn execute(&self, command: ControlCommand, echo: &mpsc::Sender<String>) -> Vec<String> {
        match command {
            ControlCommand::Quit => {
                info!("shutdown requested from control socket");
                self.shutdown.cancel();
                vec!["Exiting...".to_string()]
            }
            ControlCommand::Help => help(),
            ControlCommand::Server(name) => {
                match self.servers.iter().find(|s| s.eq_ignore_ascii_case(&name)) {
                    Some(server) => {
                        self.state.select_server(server);
                        vec![format!("Output server set to {server}")]
                    }
                    None => vec![format!("Unknown server: {name}")],
                }
            }
            ControlCommand::Channel(name) => {
                self.state.select_channel(&name);
                vec![format!("Output channel set to {name}")]
            }
            ControlCommand::Info => {
                let selection = self.state.selection();
                vec![
                    "Current output:".to_string(),
                    format!("Server: {}", selection.server.as_deref().unwrap_or("")),
                    format!("Channel: {}", selection.channel.as_deref().unwrap_or("")),
                    format!("Interactive: {}", on_off(selection.interactive)),
                    format!(
                        "Connected: {}",
                        self.outbound.registry().names().join(", ")
                    ),
                ]
            }
            ControlCommand::Interactive => {
                let on = self.state.toggle_interactive(echo.clone());
                vec![format!("Interactive mode turned {}", on_off(on))]
            }
            ControlCommand::Reminders(command) => self.reminders(command).await,
            ControlCommand::Say(text) => self.say(&text).await,
            ControlCommand::Usage(usage) => vec![usage.to_string()],
            ControlCommand::Unknown(input) => {
                let mut lines = vec![format!("Unknown command: '{input}'")];
                lines.extend(help());
                lines
            }
        }
    }

    async fn reminders(&self, command: ReminderCommand) -> Vec<String> {
        let result = match command {
            ReminderCommand::List => self.admin.list().await.map(|reminders| {
                if reminders.is_empty() {
                    vec!["No active reminders.".to_string()]
                } else {
                    reminders
                }
            }),
            ReminderCommand::Delete(id) => self
                .admin
                .delete(id)
                .await
                .map(|()| vec![format!("Reminder {id} deleted.")]),
            ReminderCommand::Purge => self
                .admin
                .purge()
                .await
                .map(|n| vec![format!("Purged {n} reminders.")]),
        };
        result.unwrap_or_else(|e| vec![e.to_string()])
    }

    async fn say(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let selection = self.state.selection();
        let Some(server) = selection.server.filter(|_| selection.interactive) else {
            return vec!["Interactive mode is off or no server selected.".to_string()];
        };
        let target = selection.channel.unwrap_or_default();
        match self.outbound.say(&server, &target, text).await {
            Ok(()) => vec![format!("[<][{server}/{target}] {text}")],
            Err(e) => vec![format!("Send failed: {e}")],
        }
    }
}

fn help() -> Vec<String> {
    HELP.iter().map(|line| line.to_string()).collect()
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

fn codec_io(err: tokio_util::codec::LinesCodecError) -> io::Error {
    match err {
        tokio_util::codec::LinesCodecError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}
