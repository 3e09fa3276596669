//! # Account Restriction Service
//!
//! Wires the cache, validator, observer and mirror together behind
//! [`AccountRestrictionApi`].
//!
//! ## Block Execution
//!
//! ```text
//! open_delta
//!   for each transaction, in block order:
//!     validate against live view ──✗──→ rejected (no trace)
//!     observer.apply            ──✗──→ rollback delta, fatal error
//! commit ──→ mirror.enqueue(delta)
//! ```
//!
//! Each transaction is validated against a view that already includes the
//! transactions accepted before it in the same block.
//!
//! Writers are serialized: one block or one rollback at a time.

use crate::domain::{
    check_address_interaction, check_mosaic_transfer, check_operation, AccountRestrictionCache,
    AccountRestrictions, CacheError, CacheSnapshot, CommittedDelta, ConfigError, ObserverError,
    PolicyFailure, RestrictionConfig, RestrictionModification, RestrictionObserver,
    RestrictionStateView, RestrictionValidator, ValidationFailure,
};
use crate::mirror::{cold_load, MirrorError, MirrorProgress, MirrorSyncHandle};
use crate::ports::inbound::AccountRestrictionApi;
use crate::ports::outbound::RestrictionDocumentStore;
use parking_lot::Mutex;
use shared_types::{address_to_hex, Address, EntityType, Height, MosaicId};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors surfaced by the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Observer error: {0}")]
    Observer(#[from] ObserverError),

    #[error("Mirror error: {0}")]
    Mirror(#[from] MirrorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A transaction rejected during block execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedModification {
    /// Position in the block.
    pub index: usize,
    pub failure: ValidationFailure,
}

/// Result of executing or rolling back one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOutcome {
    pub height: Height,
    /// Committed cache version after the block.
    pub version: u64,
    /// Transactions applied (or undone), in the order they were processed.
    pub applied: Vec<RestrictionModification>,
    pub rejected: Vec<RejectedModification>,
    /// Accounts whose restrictions changed.
    pub accounts_touched: usize,
    /// The committed delta reached the mirror queue.
    pub mirror_queued: bool,
}

/// Application service for account restrictions.
pub struct AccountRestrictionService {
    config: RestrictionConfig,
    cache: Arc<AccountRestrictionCache>,
    validator: RestrictionValidator,
    mirror: Option<MirrorSyncHandle>,
    writer: Mutex<()>,
}

impl AccountRestrictionService {
    /// Service over an empty cache, without a mirror.
    pub fn new(config: RestrictionConfig) -> Self {
        let cache = Arc::new(AccountRestrictionCache::new(config.limits));
        Self::with_cache(config, cache)
    }

    /// Service over an existing cache instance.
    ///
    /// The cache's limits win over `config.limits`; the validator must never
    /// accept a set size the cache would refuse.
    pub fn with_cache(mut config: RestrictionConfig, cache: Arc<AccountRestrictionCache>) -> Self {
        let limits = *cache.limits();
        if config.limits != limits {
            warn!(
                configured = ?config.limits,
                cache = ?limits,
                "Configured restriction limits differ from the cache, using the cache's"
            );
            config.limits = limits;
        }
        Self {
            validator: RestrictionValidator::new(&config),
            config,
            cache,
            mirror: None,
            writer: Mutex::new(()),
        }
    }

    pub fn with_mirror(mut self, mirror: MirrorSyncHandle) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Cold-loads the cache from `store`, then starts mirroring into it.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(
        config: RestrictionConfig,
        store: Arc<dyn RestrictionDocumentStore>,
    ) -> Result<Self, ServiceError> {
        let cache = Arc::new(AccountRestrictionCache::new(config.limits));
        let loaded = cold_load(store.as_ref(), &cache).await?;
        let mirror = MirrorSyncHandle::spawn(store, Arc::clone(&cache), &config);
        info!(
            accounts = loaded,
            network = config.network_identifier,
            "Account restriction service started"
        );
        Ok(Self::with_cache(config, cache).with_mirror(mirror))
    }

    pub fn config(&self) -> &RestrictionConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<AccountRestrictionCache> {
        &self.cache
    }

    pub fn validator(&self) -> &RestrictionValidator {
        &self.validator
    }

    pub fn mirror(&self) -> Option<&MirrorSyncHandle> {
        self.mirror.as_ref()
    }

    /// Committed state for speculative validation.
    pub fn snapshot(&self) -> CacheSnapshot {
        self.cache.snapshot()
    }

    /// Stops the mirror worker after it drains its queue.
    pub async fn shutdown(self) -> Result<Option<MirrorProgress>, ServiceError> {
        match self.mirror {
            Some(mirror) => Ok(Some(mirror.shutdown().await?)),
            None => Ok(None),
        }
    }

    fn discard_delta(&self, height: Height) {
        if let Err(err) = self.cache.rollback() {
            error!(height, error = %err, "Failed to discard restriction delta");
        }
    }

    fn publish(&self, delta: CommittedDelta) -> bool {
        let Some(mirror) = &self.mirror else {
            return false;
        };
        let version = delta.version;
        match mirror.enqueue(delta) {
            Ok(()) => true,
            Err(err) => {
                // The commit stands; a later resync repairs the mirror.
                error!(version, error = %err, "Failed to queue committed delta for mirror");
                false
            }
        }
    }
}

impl AccountRestrictionApi for AccountRestrictionService {
    fn execute_block(
        &self,
        height: Height,
        modifications: &[RestrictionModification],
    ) -> Result<BlockOutcome, ServiceError> {
        let _writer = self.writer.lock();
        self.cache.open_delta()?;
        let observer = RestrictionObserver::new(&self.cache);

        let mut applied = Vec::with_capacity(modifications.len());
        let mut rejected = Vec::new();
        for (index, modification) in modifications.iter().enumerate() {
            if let Err(failure) = self.validator.validate(modification, self.cache.as_ref()) {
                debug!(
                    height,
                    index,
                    account = %address_to_hex(&modification.account),
                    %failure,
                    "Rejected restriction transaction"
                );
                rejected.push(RejectedModification { index, failure });
                continue;
            }
            if let Err(err) = observer.apply(modification) {
                self.discard_delta(height);
                return Err(err.into());
            }
            applied.push(modification.clone());
        }

        let delta = self.cache.commit()?;
        let version = delta.version;
        let accounts_touched = delta.changes.len();
        let mirror_queued = self.publish(delta);

        info!(
            height,
            version,
            applied = applied.len(),
            rejected = rejected.len(),
            accounts_touched,
            "Executed restriction block"
        );
        Ok(BlockOutcome {
            height,
            version,
            applied,
            rejected,
            accounts_touched,
            mirror_queued,
        })
    }

    fn rollback_block(
        &self,
        height: Height,
        applied: &[RestrictionModification],
    ) -> Result<BlockOutcome, ServiceError> {
        let _writer = self.writer.lock();
        self.cache.open_delta()?;
        let observer = RestrictionObserver::new(&self.cache);

        let mut undone = Vec::with_capacity(applied.len());
        for modification in applied.iter().rev() {
            if let Err(err) = observer.undo(modification) {
                self.discard_delta(height);
                return Err(err.into());
            }
            undone.push(modification.clone());
        }

        let delta = self.cache.commit()?;
        let version = delta.version;
        let accounts_touched = delta.changes.len();
        let mirror_queued = self.publish(delta);

        info!(
            height,
            version,
            undone = undone.len(),
            accounts_touched,
            "Rolled back restriction block"
        );
        Ok(BlockOutcome {
            height,
            version,
            applied: undone,
            rejected: Vec::new(),
            accounts_touched,
            mirror_queued,
        })
    }

    fn validate(&self, modification: &RestrictionModification) -> Result<(), ValidationFailure> {
        self.validator.validate(modification, &self.cache.snapshot())
    }

    fn find(&self, address: &Address) -> Option<AccountRestrictions> {
        self.cache.find(address)
    }

    fn check_address_interaction(
        &self,
        source: &Address,
        recipient: &Address,
    ) -> Result<(), PolicyFailure> {
        check_address_interaction(self.cache.as_ref(), source, recipient)
    }

    fn check_mosaic_transfer(
        &self,
        account: &Address,
        mosaic: MosaicId,
    ) -> Result<(), PolicyFailure> {
        check_mosaic_transfer(self.cache.as_ref(), account, mosaic)
    }

    fn check_operation(
        &self,
        account: &Address,
        entity_type: EntityType,
    ) -> Result<(), PolicyFailure> {
        check_operation(self.cache.as_ref(), account, entity_type)
    }
}
