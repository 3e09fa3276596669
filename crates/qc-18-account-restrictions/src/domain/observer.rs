//! # Restriction Observer
//!
//! Applies validated restriction transactions to the cache's open delta and
//! undoes them on rollback.
//!
//! ## Ordering
//!
//! ```text
//! apply: deletions[0..n]   then additions[0..m]
//! undo:  additions[m..0]   then deletions[n..0]   (each inverted)
//! ```
//!
//! Removing before adding lets a transaction swap values at full capacity.
//! Undo replays the exact inverse in exact reverse order, so `apply` followed
//! by `undo` restores the cache bit for bit, entity existence included.
//!
//! A value-set error here means the validator let through something the
//! cache rejects. That is a desynchronization, never a user error: it is
//! logged and surfaced as fatal, and the caller must discard the delta.

use super::cache::{AccountRestrictionCache, CacheMutation, MutationAction};
use super::errors::{CacheError, ObserverError};
use super::transactions::RestrictionModification;
use super::values::RestrictionValue;
use shared_types::address_to_hex;
use tracing::{debug, error};

/// Whether a transaction is being applied or undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverMode {
    Commit,
    Rollback,
}

/// Mutations performed for one transaction, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyJournal {
    pub mutations: Vec<CacheMutation>,
}

impl ApplyJournal {
    /// True when `undo` performed the exact inverse of `self` in reverse order.
    pub fn is_undone_by(&self, undo: &ApplyJournal) -> bool {
        self.mutations.len() == undo.mutations.len()
            && self
                .mutations
                .iter()
                .zip(undo.mutations.iter().rev())
                .all(|(forward, inverse)| forward.is_inverse_of(inverse))
    }

    /// True when the account had no restrictions before the transaction.
    pub fn created_account(&self) -> bool {
        self.mutations.iter().any(|m| m.account_created)
    }
}

/// Applies and undoes restriction transactions against one cache.
pub struct RestrictionObserver<'a> {
    cache: &'a AccountRestrictionCache,
}

impl<'a> RestrictionObserver<'a> {
    pub fn new(cache: &'a AccountRestrictionCache) -> Self {
        Self { cache }
    }

    pub fn notify(
        &self,
        modification: &RestrictionModification,
        mode: ObserverMode,
    ) -> Result<ApplyJournal, ObserverError> {
        match mode {
            ObserverMode::Commit => self.apply(modification),
            ObserverMode::Rollback => self.undo(modification),
        }
    }

    /// Applies deletions, then additions.
    pub fn apply(
        &self,
        modification: &RestrictionModification,
    ) -> Result<ApplyJournal, ObserverError> {
        let steps = modification
            .deletions
            .iter()
            .map(|value| (MutationAction::Remove, value))
            .chain(
                modification
                    .additions
                    .iter()
                    .map(|value| (MutationAction::Add, value)),
            );
        self.run(modification, steps, ObserverMode::Commit)
    }

    /// Inverts additions (reversed), then deletions (reversed).
    pub fn undo(
        &self,
        modification: &RestrictionModification,
    ) -> Result<ApplyJournal, ObserverError> {
        let steps = modification
            .additions
            .iter()
            .rev()
            .map(|value| (MutationAction::Remove, value))
            .chain(
                modification
                    .deletions
                    .iter()
                    .rev()
                    .map(|value| (MutationAction::Add, value)),
            );
        self.run(modification, steps, ObserverMode::Rollback)
    }

    fn run<'v, I>(
        &self,
        modification: &RestrictionModification,
        steps: I,
        mode: ObserverMode,
    ) -> Result<ApplyJournal, ObserverError>
    where
        I: Iterator<Item = (MutationAction, &'v RestrictionValue)>,
    {
        let account = &modification.account;
        let flags = modification.flags;
        let mut journal = ApplyJournal::default();

        for (action, value) in steps {
            let result = match action {
                MutationAction::Add => self.cache.apply_add(account, flags, *value),
                MutationAction::Remove => self.cache.apply_remove(account, flags, *value),
            };
            let mutation = result.map_err(|err| match err {
                CacheError::ValueSet(source) => {
                    error!(
                        account = %address_to_hex(account),
                        %flags,
                        %value,
                        ?mode,
                        error = %source,
                        "Restriction observer desynchronized from validator"
                    );
                    ObserverError::Desynchronized {
                        account: address_to_hex(account),
                        flags,
                        value: *value,
                        source,
                    }
                }
                other => ObserverError::Cache(other),
            })?;
            journal.mutations.push(mutation);
        }

        debug!(
            account = %address_to_hex(account),
            %flags,
            ?mode,
            mutations = journal.mutations.len(),
            "Observed restriction transaction"
        );
        Ok(journal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::RestrictionStateView;
    use crate::domain::config::RestrictionLimits;
    use crate::domain::flags::{Direction, Polarity, RestrictionFlags};
    use crate::domain::values::RestrictionValue;
    use shared_types::Address;

    const ACCOUNT: Address = [0x98; 24];

    fn addr(byte: u8) -> RestrictionValue {
        let mut address = [byte; 24];
        address[0] = 0x98;
        RestrictionValue::Address(address)
    }

    fn block_outgoing() -> RestrictionFlags {
        RestrictionFlags::address(Polarity::Block, Direction::Outgoing)
    }

    fn modification(adds: &[u8], removes: &[u8]) -> RestrictionModification {
        RestrictionModification {
            account: ACCOUNT,
            flags: block_outgoing(),
            additions: adds.iter().map(|b| addr(*b)).collect(),
            deletions: removes.iter().map(|b| addr(*b)).collect(),
        }
    }

    #[test]
    fn test_apply_then_undo_removes_account() {
        let cache = AccountRestrictionCache::new(RestrictionLimits::uniform(4));
        let observer = RestrictionObserver::new(&cache);
        let tx = modification(&[2], &[]);

        cache.open_delta().unwrap();
        let applied = observer.apply(&tx).unwrap();
        assert!(applied.created_account());
        let account = cache.find(&ACCOUNT).unwrap();
        assert_eq!(account.len(), 1);
        assert!(account.set(&block_outgoing()).unwrap().contains(&addr(2)));

        let undone = observer.undo(&tx).unwrap();
        assert!(applied.is_undone_by(&undone));
        assert!(cache.find(&ACCOUNT).is_none());
    }

    #[test]
    fn test_swap_at_capacity_removes_first() {
        let cache = AccountRestrictionCache::new(RestrictionLimits::uniform(2));
        let observer = RestrictionObserver::new(&cache);

        cache.open_delta().unwrap();
        observer.apply(&modification(&[2, 3], &[])).unwrap();
        cache.commit().unwrap();
        let before = cache.find(&ACCOUNT);

        cache.open_delta().unwrap();
        let swap = modification(&[4], &[2]);
        observer.notify(&swap, ObserverMode::Commit).unwrap();
        let set = cache.find(&ACCOUNT).unwrap();
        let values: Vec<_> = set.set(&block_outgoing()).unwrap().iter().copied().collect();
        assert_eq!(values, vec![addr(3), addr(4)]);

        observer.notify(&swap, ObserverMode::Rollback).unwrap();
        assert_eq!(cache.find(&ACCOUNT), before);
    }

    #[test]
    fn test_desynchronization_is_fatal() {
        let cache = AccountRestrictionCache::new(RestrictionLimits::uniform(4));
        let observer = RestrictionObserver::new(&cache);

        cache.open_delta().unwrap();
        let err = observer.apply(&modification(&[], &[9])).unwrap_err();
        assert!(matches!(err, ObserverError::Desynchronized { .. }));
    }

    #[test]
    fn test_apply_without_delta_is_cache_error() {
        let cache = AccountRestrictionCache::new(RestrictionLimits::uniform(4));
        let observer = RestrictionObserver::new(&cache);
        assert_eq!(
            observer.apply(&modification(&[2], &[])),
            Err(ObserverError::Cache(CacheError::NoOpenDelta))
        );
    }
}
