//! One live socket to one named server.
//!
//! A [`Connection`] owns the write half of the stream. Any task may write
//! through it; a per-connection async mutex keeps each line whole. The read
//! half stays with the session driver, which watches [`Connection::closed`]
//! to learn that the entry was removed or replaced.

use std::any::Any;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Boxed write half of a bot stream.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Per-process unique connection id.
pub type ConnectionId = u64;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Feature context attached to a connection (for example a loaded
/// challenge set).
pub type ConnectionContext = Arc<dyn Any + Send + Sync>;

/// A live connection, shared through the registry.
pub struct Connection {
    id: ConnectionId,
    server: String,
    writer: tokio::sync::Mutex<BoxedWriter>,
    last_keepalive: Mutex<Instant>,
    connected_at: DateTime<Utc>,
    closed: CancellationToken,
    context: RwLock<Option<ConnectionContext>>,
}

impl Connection {
    pub fn new(server: impl Into<String>, writer: BoxedWriter) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            server: server.into(),
            writer: tokio::sync::Mutex::new(writer),
            last_keepalive: Mutex::new(Instant::now()),
            connected_at: Utc::now(),
            closed: CancellationToken::new(),
            context: RwLock::new(None),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Registry key.
    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// When the server last answered a keep-alive ping.
    pub fn last_keepalive(&self) -> Instant {
        *self.last_keepalive.lock()
    }

    pub fn touch_keepalive(&self) {
        *self.last_keepalive.lock() = Instant::now();
    }

    /// Write one line, appending CRLF.
    ///
    /// Fails with `BrokenPipe` once the connection is closed, including a
    /// write already waiting on the lock or on a full socket when
    /// [`close`](Self::close) is called.
    pub async fn write_line(&self, line: &str) -> io::Result<()> {
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(closed_error()),
            result = self.write_locked(line) => result,
        }
    }

    async fn write_locked(&self, line: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        if self.closed.is_cancelled() {
            return Err(closed_error());
        }
        writer.write_all(line.as_bytes()).await?;
        if !line.ends_with("\r\n") {
            writer.write_all(b"\r\n").await?;
        }
        writer.flush().await
    }

    /// Mark the connection closed. Pending and future writes fail and the
    /// session driver stops reading.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Token cancelled by [`close`](Self::close).
    pub fn closed(&self) -> CancellationToken {
        self.closed.clone()
    }

    /// Attach feature context, replacing any previous value.
    pub fn set_context<T: Any + Send + Sync>(&self, value: T) {
        *self.context.write() = Some(Arc::new(value));
    }

    /// Attached context, if present and of type `T`.
    pub fn context<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.context
            .read()
            .clone()
            .and_then(|ctx| ctx.downcast::<T>().ok())
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "connection closed")
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("server", &self.server)
            .field("connected_at", &self.connected_at)
            .field("closed", &self.is_closed())
            .finish()
    }
}
