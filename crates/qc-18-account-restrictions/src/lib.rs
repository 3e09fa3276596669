//! # Account Restrictions Subsystem
//!
//! **Subsystem ID:** 18
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Maintains per-account allow/block lists over three kinds of values
//! (addresses, mosaics, transaction types), validates restriction
//! transactions, applies them reversibly, and mirrors committed state into an
//! external document store.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | A set never exceeds its kind's max size | `domain/value_set.rs` - `check_add()` |
//! | Empty sets and accounts do not exist | `domain/cache.rs` - `apply_remove()` prunes |
//! | An account never restricts itself | `domain/validation.rs` - `check_value()` |
//! | `apply; undo` restores state exactly | `domain/observer.rs` - reverse-order inverse |
//! | At most one open delta | `domain/cache.rs` - `open_delta()` |
//! | Mirror applies deltas in commit order | `mirror/sync.rs` - single worker, FIFO queue |
//!
//! ## State Layers
//!
//! ```text
//!   readers ──→ find() ──→ [delta] ──miss──→ [base]
//!                            │                  ↑
//!                            └──── commit() ────┘   (atomic merge, version + 1)
//!                            └──── rollback() ──→ ∅
//! ```
//!
//! ## Validation Order
//!
//! | # | Failure | Meaning |
//! |---|---------|---------|
//! | 0 | `InvalidRestrictionFlags` | Value kind disagrees with the flags |
//! | 1 | `DuplicateModification` | Value repeated within or across add/remove lists |
//! | 2 | `InvalidModificationValue` | Self address, sentinel, foreign network, reserved id |
//! | 3 | `RedundantModification` | Adding a present value or removing an absent one |
//! | 4 | `ConflictingPolarity` | Opposite-polarity set still non-empty |
//! | 5 | `ModificationCountExceeded` | Resulting set larger than max size |
//! | 6 | `InvalidModificationsCount` | Entry count outside `1..=max` |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/memory.rs  - InMemoryDocumentStore                    │
//! │  adapters/rocksdb.rs - RocksDbDocumentStore (feature "rocksdb") │
//! │  mirror/             - documents, sync worker, cold load        │
//! │  service.rs          - AccountRestrictionService                │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - AccountRestrictionApi trait                │
//! │  ports/outbound.rs - RestrictionDocumentStore trait             │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/flags.rs       - RestrictionFlags (kind/polarity/dir)   │
//! │  domain/value_set.rs   - bounded RestrictionValueSet            │
//! │  domain/cache.rs       - versioned base + delta cache           │
//! │  domain/validation.rs  - RestrictionValidator                   │
//! │  domain/observer.rs    - RestrictionObserver (apply / undo)     │
//! │  domain/policy.rs      - allow/block checks for other txs       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let store = Arc::new(InMemoryDocumentStore::new());
//! let service = AccountRestrictionService::start(RestrictionConfig::from_env()?, store).await?;
//!
//! let outcome = service.execute_block(height, &modifications)?;
//! service.mirror().unwrap().wait_for_version(outcome.version).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod mirror;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use domain::*;
pub use mirror::{cold_load, MirrorError, MirrorProgress, MirrorSyncHandle, RestrictionDocument};
pub use ports::*;
pub use service::{AccountRestrictionService, BlockOutcome, RejectedModification, ServiceError};
