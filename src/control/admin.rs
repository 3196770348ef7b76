//! Reminder administration collaborator.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdminError {
    #[error("no reminder service is attached")]
    Unavailable,
    #[error("reminder {0} not found")]
    NotFound(u64),
    #[error("reminder service error: {0}")]
    Backend(String),
}

/// Administrative access to the reminder scheduler.
#[async_trait]
pub trait ReminderAdmin: Send + Sync {
    /// One human-readable line per active reminder.
    async fn list(&self) -> Result<Vec<String>, AdminError>;

    async fn delete(&self, id: u64) -> Result<(), AdminError>;

    /// Delete everything. Returns how many were removed.
    async fn purge(&self) -> Result<usize, AdminError>;
}

/// Used when no reminder scheduler is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReminders;

#[async_trait]
impl ReminderAdmin for NoReminders {
    async fn list(&self) -> Result<Vec<String>, AdminError> {
        Err(AdminError::Unavailable)
    }

    async fn delete(&self, _id: u64) -> Result<(), AdminError> {
        Err(AdminError::Unavailable)
    }

    async fn purge(&self) -> Result<usize, AdminError> {
        Err(AdminError::Unavailable)
    }
}
