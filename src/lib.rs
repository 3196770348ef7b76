//! skuzzy - a persistent IRC bot core.
//!
//! One [`network::Supervisor`] per configured server keeps a session alive,
//! [`dispatch::Dispatcher`] routes channel and private traffic onto feature
//! queues, and [`control`] exposes an operator socket.

pub mod config;
pub mod control;
pub mod dispatch;
pub mod error;
pub mod features;
pub mod network;
pub mod telemetry;
