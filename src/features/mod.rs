//! Boundary to out-of-core feature collaborators.
//!
//! The dispatcher enqueues [`FeatureEvent`]s onto [`FeatureQueues`]; the
//! [`WorkerHost`] runs one supervised task per queue that feeds a
//! [`FeatureHandler`].

mod event;
mod handler;
mod host;
mod queues;

pub use event::{FeatureEvent, FeatureKind, MessageFlags};
pub use handler::{FeatureHandler, LoggingHandler};
pub use host::WorkerHost;
pub use queues::{FeatureQueues, FeatureReceivers};
