//! Network module.
//!
//! Contains the per-server supervisor and session driver, the shared
//! connection registry, and the paced outbound path.

mod connection;
mod outbound;
mod registry;
mod session;
mod stream;
mod supervisor;
pub mod tls;

pub use connection::{BoxedWriter, Connection, ConnectionId};
pub use outbound::Outbound;
pub use registry::ConnectionRegistry;
pub use session::run_session;
pub use stream::BotStream;
pub use supervisor::Supervisor;
