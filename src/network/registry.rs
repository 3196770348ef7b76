//! Name-keyed table of live connections.
//!
//! The registry is the single source of truth for "is this server
//! connected, and through which socket". Senders take the shared lock just
//! long enough to clone the entry, then write on it with the lock released.
//! Installing and tearing down take the exclusive lock. Entries are never
//! patched in place: replacement is always remove-then-insert.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::connection::{Connection, ConnectionId};
use crate::error::RegistryError;
use crate::telemetry::redact_line;

/// Concurrency-safe server name → connection table.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: RwLock<HashMap<String, Arc<Connection>>>,
}

impl ConnectionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `conn` under its server name and return the entry it
    /// replaced. The caller closes the returned connection.
    pub fn install(&self, conn: Arc<Connection>) -> Option<Arc<Connection>> {
        let mut entries = self.entries.write();
        let prior = entries.remove(conn.server());
        entries.insert(conn.server().to_string(), conn);
        prior
    }

    /// Current connection for `server`.
    pub fn lookup(&self, server: &str) -> Option<Arc<Connection>> {
        self.entries.read().get(server).cloned()
    }

    /// Current connection for `server`, only if it is still `id`.
    pub fn lookup_id(&self, server: &str, id: ConnectionId) -> Option<Arc<Connection>> {
        self.lookup(server).filter(|c| c.id() == id)
    }

    /// Remove and close the entry for `server`.
    pub fn remove(&self, server: &str) -> Option<Arc<Connection>> {
        let removed = self.entries.write().remove(server);
        if let Some(conn) = &removed {
            conn.close();
        }
        removed
    }

    /// Remove and close the entry for `server` only if it is still `id`.
    /// A session tearing down never removes its successor.
    pub fn remove_connection(&self, server: &str, id: ConnectionId) -> bool {
        let removed = {
            let mut entries = self.entries.write();
            match entries.get(server) {
                Some(conn) if conn.id() == id => entries.remove(server),
                _ => None,
            }
        };
        match removed {
            Some(conn) => {
                conn.close();
                true
            }
            None => false,
        }
    }

    /// Visit every entry under the exclusive lock. `f` returns `false` to
    /// drop the entry. Used for bulk shutdown.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &Arc<Connection>) -> bool,
    {
        self.entries.write().retain(|name, conn| f(name, conn));
    }

    /// Close and drop every entry. Returns how many were closed.
    pub fn close_all(&self) -> usize {
        let mut closed = 0;
        self.for_each(|_, conn| {
            conn.close();
            closed += 1;
            false
        });
        closed
    }

    /// Names of connected servers, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when no server is connected.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Look up `server` and write one line on it.
    pub async fn send_line(&self, server: &str, line: &str) -> Result<(), RegistryError> {
        let conn = self.resolve(server)?;
        debug!(server = %server, "< {}", line);
        write(&conn, line).await
    }

    /// Like [`send_line`](Self::send_line) but the line is never logged.
    pub async fn send_secret(&self, server: &str, line: &str) -> Result<(), RegistryError> {
        let conn = self.resolve(server)?;
        debug!(server = %server, "< {}", redact_line(line));
        write(&conn, line).await
    }

    fn resolve(&self, server: &str) -> Result<Arc<Connection>, RegistryError> {
        self.lookup(server)
            .ok_or_else(|| RegistryError::NotConnected(server.to_string()))
    }
}

async fn write(conn: &Connection, line: &str) -> Result<(), RegistryError> {
    conn.write_line(line)
        .await
        .map_err(|source| RegistryError::Write {
            server: conn.server().to_string(),
            source,
        })
}
