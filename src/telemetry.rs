//! Logging setup and span helpers.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to open log file: {0}")]
    LogFile(#[from] std::io::Error),
    #[error("failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Install the global subscriber.
///
/// Logs go to stdout, filtered by `RUST_LOG` (default `info`). With
/// `log_file`, the same events are also appended to that file without ANSI
/// colours.
pub fn init(log_file: Option<&Path>) -> Result<(), TelemetryError> {
    let file_layer = match log_file {
        Some(path) => {
            let file: File = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()?;
    Ok(())
}

/// Loggable form of a line that carries a credential: the command and
/// target survive, the rest is masked.
pub fn redact_line(line: &str) -> String {
    match line.split_once(' ') {
        Some((command, rest)) if command.eq_ignore_ascii_case("PRIVMSG") => {
            let target = rest.split(' ').next().unwrap_or("");
            format!("{command} {target} :<redacted>")
        }
        Some((command, _)) => format!("{command} <redacted>"),
        None => "<redacted>".to_string(),
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{info_span, Span};

    /// Span for one supervised server.
    pub fn server(name: &str) -> Span {
        info_span!("server", name = %name)
    }

    /// Span for one session attempt.
    pub fn session(attempt: u64) -> Span {
        info_span!("session", attempt)
    }

    /// Span for one control-socket client.
    pub fn control(client: u64) -> Span {
        info_span!("control", client)
    }

    /// Span for one feature worker.
    pub fn worker(kind: &str) -> Span {
        info_span!("worker", kind = %kind)
    }
}
