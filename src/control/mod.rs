//! Operator control channel.
//!
//! - [`command`]: line parsing
//! - [`state`]: selected server/channel and the interactive echo stream
//! - [`admin`]: reminder administration collaborator
//! - [`server`]: the Unix socket listener

mod admin;
mod command;
mod server;
mod state;

pub use admin::{AdminError, NoReminders, ReminderAdmin};
pub use command::{ControlCommand, ReminderCommand, HELP};
pub use server::ControlServer;
pub use state::{ControlState, Selection};
