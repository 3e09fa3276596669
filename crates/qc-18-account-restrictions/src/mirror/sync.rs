//! # Mirror Sync Worker
//!
//! Applies committed deltas to the document store in commit order, off the
//! cache's critical path.
//!
//! ## Delivery
//!
//! At-least-once. Upsert and delete are idempotent, so replaying a batch
//! that partly reached the store is harmless.
//!
//! | Situation | Worker reaction |
//! |-----------|-----------------|
//! | Batch fails | Retry with doubling backoff, up to `mirror_max_retries` |
//! | Retries exhausted | Mark dirty, full resync before the next batch |
//! | Queue full on `enqueue` | Delta dropped, overflow flag set, full resync |
//! | Delta version already synced | Skipped |
//!
//! A full resync reads a committed snapshot, upserts every account in it,
//! and deletes every stored document the snapshot no longer contains.

use super::document::RestrictionDocument;
use super::MirrorError;
use crate::domain::{AccountRestrictionCache, CommittedDelta, RestrictionConfig};
use crate::ports::outbound::{DocumentOperation, RestrictionDocumentStore, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Published after every change in worker state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorProgress {
    /// Highest committed version the store is known to reflect.
    pub synced_version: u64,
    /// The store may be behind and a full resync is pending.
    pub dirty: bool,
    /// Completed full resyncs.
    pub resyncs: u64,
    /// Batches that exhausted their retries.
    pub failed_batches: u64,
}

#[derive(Debug)]
enum SyncCommand {
    Apply(CommittedDelta),
    Resync,
}

/// Owner side of the sync worker.
pub struct MirrorSyncHandle {
    sender: mpsc::Sender<SyncCommand>,
    overflow: Arc<AtomicBool>,
    wake: Arc<Notify>,
    progress: watch::Receiver<MirrorProgress>,
    worker: JoinHandle<()>,
}

impl MirrorSyncHandle {
    /// Starts the worker on the current tokio runtime.
    ///
    /// The store is assumed to reflect the cache's current committed
    /// version, as it does right after [`super::cold_load`].
    pub fn spawn(
        store: Arc<dyn RestrictionDocumentStore>,
        cache: Arc<AccountRestrictionCache>,
        config: &RestrictionConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.mirror_queue_capacity.max(1));
        let initial = MirrorProgress {
            synced_version: cache.committed_version(),
            ..MirrorProgress::default()
        };
        let (progress_tx, progress) = watch::channel(initial);
        let overflow = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());

        let worker = SyncWorker {
            store,
            cache,
            receiver,
            overflow: Arc::clone(&overflow),
            wake: Arc::clone(&wake),
            progress: progress_tx,
            state: initial,
            max_retries: config.mirror_max_retries,
            backoff: config.mirror_retry_backoff,
        };
        info!(
            synced_version = initial.synced_version,
            capacity = config.mirror_queue_capacity,
            "Starting mirror sync worker"
        );

        Self {
            sender,
            overflow,
            wake,
            progress,
            worker: tokio::spawn(worker.run()),
        }
    }

    /// Queues a committed delta. Never waits.
    ///
    /// A full queue drops the delta and schedules a full resync, which
    /// covers it because the delta is already committed.
    pub fn enqueue(&self, delta: CommittedDelta) -> Result<(), MirrorError> {
        let version = delta.version;
        match self.sender.try_send(SyncCommand::Apply(delta)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(version, "Mirror queue full, scheduling full resync");
                self.schedule_overflow_resync();
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(MirrorError::QueueClosed),
        }
    }

    /// Schedules a full resync from the next committed snapshot.
    pub fn request_resync(&self) -> Result<(), MirrorError> {
        match self.sender.try_send(SyncCommand::Resync) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.schedule_overflow_resync();
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(MirrorError::QueueClosed),
        }
    }

    /// Raises the overflow flag and wakes the worker even if it is parked
    /// on an empty queue. `Notify` keeps the permit when nobody waits yet.
    fn schedule_overflow_resync(&self) {
        self.overflow.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    pub fn progress(&self) -> MirrorProgress {
        *self.progress.borrow()
    }

    pub fn synced_version(&self) -> u64 {
        self.progress.borrow().synced_version
    }

    /// Resolves once the store reflects at least `version`.
    pub async fn wait_for_version(&self, version: u64) -> Result<u64, MirrorError> {
        let mut progress = self.progress.clone();
        let reached = progress
            .wait_for(|p| p.synced_version >= version)
            .await
            .map_err(|_| MirrorError::QueueClosed)?;
        Ok(reached.synced_version)
    }

    /// Drains queued deltas, then stops the worker.
    pub async fn shutdown(self) -> Result<MirrorProgress, MirrorError> {
        let Self {
            sender,
            progress,
            worker,
            ..
        } = self;
        drop(sender);
        worker
            .await
            .map_err(|err| MirrorError::WorkerStopped(err.to_string()))?;
        let last = *progress.borrow();
        info!(synced_version = last.synced_version, "Mirror sync worker stopped");
        Ok(last)
    }
}

struct SyncWorker {
    store: Arc<dyn RestrictionDocumentStore>,
    cache: Arc<AccountRestrictionCache>,
    receiver: mpsc::Receiver<SyncCommand>,
    overflow: Arc<AtomicBool>,
    wake: Arc<Notify>,
    progress: watch::Sender<MirrorProgress>,
    state: MirrorProgress,
    max_retries: u32,
    backoff: Duration,
}

impl SyncWorker {
    async fn run(mut self) {
        loop {
            let command = tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(command) => Some(command),
                    None => break,
                },
                _ = self.wake.notified() => None,
            };

            if self.overflow.swap(false, Ordering::AcqRel) {
                self.mark_dirty();
            }

            match command {
                Some(SyncCommand::Resync) => self.mark_dirty(),
                // While dirty, the pending resync snapshot covers the delta.
                Some(SyncCommand::Apply(delta)) if !self.state.dirty => {
                    self.apply_delta(delta).await
                }
                Some(SyncCommand::Apply(_)) | None => {}
            }

            if self.state.dirty {
                self.resync().await;
            }
        }

        if self.overflow.swap(false, Ordering::AcqRel) {
            self.mark_dirty();
        }
        if self.state.dirty {
            self.resync().await;
        }
    }

    async fn apply_delta(&mut self, delta: CommittedDelta) {
        if delta.version <= self.state.synced_version {
            debug!(
                version = delta.version,
                synced_version = self.state.synced_version,
                "Skipping already mirrored delta"
            );
            return;
        }

        let operations: Vec<DocumentOperation> = delta
            .changes
            .iter()
            .map(|change| match &change.restrictions {
                Some(account) => DocumentOperation::Upsert(RestrictionDocument::from(account)),
                None => DocumentOperation::Delete(change.address),
            })
            .collect();
        let count = operations.len();

        match self.write_with_retry(operations, delta.version).await {
            Ok(()) => {
                debug!(version = delta.version, operations = count, "Mirrored committed delta");
                self.state.synced_version = delta.version;
                self.publish();
            }
            Err(err) => {
                error!(
                    version = delta.version,
                    error = %err,
                    "Mirror batch failed after retries, scheduling full resync"
                );
                self.state.failed_batches += 1;
                self.mark_dirty();
            }
        }
    }

    async fn resync(&mut self) {
        let snapshot = self.cache.snapshot();
        let version = snapshot.version();

        let stored = match self.store.load_all().await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(version, error = %err, "Mirror resync could not read the store");
                return;
            }
        };

        let mut operations = Vec::with_capacity(stored.len() + snapshot.len());
        for document in &stored {
            match document.address() {
                Ok(address) if !snapshot.contains(&address) => {
                    operations.push(DocumentOperation::Delete(address));
                }
                Ok(_) => {}
                Err(err) => warn!(
                    account = %document.account,
                    error = %err,
                    "Ignoring stored document with unreadable account"
                ),
            }
        }
        let stale = operations.len();
        operations.extend(
            snapshot
                .accounts()
                .map(|account| DocumentOperation::Upsert(RestrictionDocument::from(account))),
        );

        match self.write_with_retry(operations, version).await {
            Ok(()) => {
                self.state.dirty = false;
                self.state.resyncs += 1;
                self.state.synced_version = self.state.synced_version.max(version);
                info!(
                    version,
                    accounts = snapshot.len(),
                    stale,
                    "Mirror resynchronized from committed snapshot"
                );
                self.publish();
            }
            Err(err) => {
                error!(version, error = %err, "Mirror resync failed, store remains dirty");
            }
        }
    }

    async fn write_with_retry(
        &self,
        operations: Vec<DocumentOperation>,
        version: u64,
    ) -> Result<(), StoreError> {
        let mut attempt = 0u32;
        loop {
            match self.store.apply_batch(operations.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.max_retries => {
                    let delay = self.backoff.saturating_mul(1u32 << attempt.min(16));
                    attempt += 1;
                    warn!(
                        version,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Mirror write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn mark_dirty(&mut self) {
        if !self.state.dirty {
            self.state.dirty = true;
            self.publish();
        }
    }

    fn publish(&self) {
        self.progress.send_replace(self.state);
    }
}

impl std::fmt::Debug for MirrorSyncHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorSyncHandle")
            .field("progress", &*self.progress.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryDocumentStore;
    use crate::domain::{Polarity, RestrictionFlags, RestrictionLimits, RestrictionValue};
    use shared_types::{networks, Address, MosaicId};

    fn account(byte: u8) -> Address {
        let mut address = [byte; 24];
        address[0] = networks::TESTNET;
        address
    }

    #[tokio::test]
    async fn test_overflow_wakes_worker_parked_on_empty_queue() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let cache = Arc::new(AccountRestrictionCache::new(RestrictionLimits::default()));
        let dyn_store: Arc<dyn RestrictionDocumentStore> = store.clone();
        let handle = MirrorSyncHandle::spawn(dyn_store, Arc::clone(&cache), &RestrictionConfig::default());

        // Let the worker park in its receive loop with nothing queued.
        tokio::task::yield_now().await;

        cache.open_delta().unwrap();
        cache
            .apply_add(
                &account(1),
                RestrictionFlags::mosaic(Polarity::Block),
                RestrictionValue::Mosaic(MosaicId(9)),
            )
            .unwrap();
        cache.commit().unwrap();

        // The delta never reaches the queue; only the overflow signal does.
        handle.schedule_overflow_resync();

        let reached = tokio::time::timeout(Duration::from_secs(5), handle.wait_for_version(1))
            .await
            .expect("worker stayed parked after overflow")
            .unwrap();
        assert_eq!(reached, 1);
        assert_eq!(handle.progress().resyncs, 1);
        assert!(store.get(&account(1)).is_some());

        let progress = handle.shutdown().await.unwrap();
        assert!(!progress.dirty);
    }
}
