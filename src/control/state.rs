//! Operator selection and the interactive echo stream.

use parking_lot::Mutex;
use skuzzy_proto::irc_eq;
use tokio::sync::mpsc;
use tracing::debug;

/// What the operator is currently looking at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub server: Option<String>,
    pub channel: Option<String>,
    pub interactive: bool,
}

/// Shared between the control socket and every dispatcher.
///
/// Lock order: `selection`, then `echo`.
#[derive(Debug, Default)]
pub struct ControlState {
    selection: Mutex<Selection>,
    echo: Mutex<Option<mpsc::Sender<String>>>,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Selection {
        self.selection.lock().clone()
    }

    pub fn select_server(&self, server: &str) {
        self.selection.lock().server = Some(server.to_string());
    }

    pub fn select_channel(&self, channel: &str) {
        self.selection.lock().channel = Some(channel.to_string());
    }

    /// Flip interactive mode. Turning it on routes echoes to `sink`,
    /// replacing any earlier client. Returns the new mode.
    pub fn toggle_interactive(&self, sink: mpsc::Sender<String>) -> bool {
        let mut selection = self.selection.lock();
        selection.interactive = !selection.interactive;
        *self.echo.lock() = selection.interactive.then_some(sink);
        selection.interactive
    }

    /// Forget `sink` if it is the current echo target, for example when its
    /// client disconnects.
    pub fn detach(&self, sink: &mpsc::Sender<String>) {
        let mut selection = self.selection.lock();
        let mut echo = self.echo.lock();
        if echo.as_ref().is_some_and(|s| s.same_channel(sink)) {
            *echo = None;
            selection.interactive = false;
        }
    }

    /// Best-effort echo of a channel line. Never waits; a full or closed
    /// stream drops the line. Returns whether it was delivered.
    pub fn offer_echo(&self, server: &str, channel: &str, sender: &str, text: &str) -> bool {
        {
            let selection = self.selection.lock();
            let wanted = selection.interactive
                && selection.server.as_deref() == Some(server)
                && selection
                    .channel
                    .as_deref()
                    .is_some_and(|c| irc_eq(c, channel));
            if !wanted {
                return false;
            }
        }

        let echo = self.echo.lock();
        let Some(sink) = echo.as_ref() else {
            return false;
        };
        match sink.try_send(format!("[{server}/{channel}] <{sender}> {text}")) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "echo dropped");
                false
            }
        }
    }
}
