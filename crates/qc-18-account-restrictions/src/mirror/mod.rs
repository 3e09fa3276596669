//! # External Mirror
//!
//! A derived, queryable copy of committed restriction state.
//!
//! ```text
//! cache.commit() ──→ CommittedDelta ──→ MirrorSyncHandle::enqueue
//!                                            │  (bounded queue, commit order)
//!                                            ↓
//!                                      sync worker ──→ RestrictionDocumentStore
//!                                            │
//!                                            └──→ watch: MirrorProgress
//! ```
//!
//! The mirror is never read during normal operation. At startup
//! [`cold_load`] runs once in the other direction to rebuild the cache base.

pub mod cold_load;
pub mod document;
pub mod sync;

pub use cold_load::cold_load;
pub use document::{RestrictionDocument, RestrictionSetDocument};
pub use sync::{MirrorProgress, MirrorSyncHandle};

use crate::domain::CacheError;
use crate::ports::outbound::StoreError;
use thiserror::Error;

/// Mirror synchronization and cold-load errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Malformed document for account {account}: {reason}")]
    MalformedDocument { account: String, reason: String },

    #[error("Document for account {account} appears more than once")]
    DuplicateDocument { account: String },

    #[error("Cannot restore cache: {0}")]
    Cache(#[from] CacheError),

    #[error("Mirror sync queue is closed")]
    QueueClosed,

    #[error("Mirror sync worker stopped: {0}")]
    WorkerStopped(String),
}
