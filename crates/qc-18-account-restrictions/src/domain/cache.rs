//! # Versioned Account Restriction Cache
//!
//! Committed `base` state plus at most one pending `delta` layer.
//!
//! ## Read Path
//!
//! Reads overlay the delta on the base: a delta entry shadows the base entry,
//! and a removal marker in the delta hides it.
//!
//! ## Write Path
//!
//! ```text
//! open_delta ──→ apply_add / apply_remove ... ──→ commit   (delta merged into base)
//!                                            └──→ rollback (delta discarded)
//! ```
//!
//! ## Snapshots
//!
//! The base is held behind an `Arc`. `snapshot()` hands out a clone of that
//! `Arc`, and `commit()` merges through `Arc::make_mut`, so an outstanding
//! snapshot keeps seeing the base it was taken from while new readers see
//! the merged base. Readers never observe a partially merged state: the
//! merge happens under the write lock.

use super::config::RestrictionLimits;
use super::entities::AccountRestrictions;
use super::errors::{CacheError, ValueSetError};
use super::flags::RestrictionFlags;
use super::value_set::RestrictionValueSet;
use super::values::RestrictionValue;
use parking_lot::RwLock;
use shared_types::{address_to_hex, Address};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

type AccountMap = HashMap<Address, AccountRestrictions>;

/// Read-only access to restriction state.
///
/// Implemented by the live cache (delta overlaid on base) and by committed
/// snapshots. Validators and policy checks only ever see this trait.
pub trait RestrictionStateView: Send + Sync {
    fn find(&self, address: &Address) -> Option<AccountRestrictions>;
}

/// Direction of a single cache mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationAction {
    Add,
    Remove,
}

/// Record of one applied mutation, including entity lifecycle side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMutation {
    pub address: Address,
    pub flags: RestrictionFlags,
    pub value: RestrictionValue,
    pub action: MutationAction,
    /// The account had no restrictions before this add.
    pub account_created: bool,
    /// The value set did not exist before this add.
    pub set_created: bool,
    /// This removal emptied (and pruned) the value set.
    pub set_removed: bool,
    /// This removal emptied (and dropped) the account.
    pub account_removed: bool,
}

impl CacheMutation {
    /// True when `other` exactly undoes `self`, side effects included.
    pub fn is_inverse_of(&self, other: &CacheMutation) -> bool {
        self.address == other.address
            && self.flags == other.flags
            && self.value == other.value
            && self.action != other.action
            && self.account_created == other.account_removed
            && self.set_created == other.set_removed
            && self.account_removed == other.account_created
            && self.set_removed == other.set_created
    }
}

/// Resulting state of one account touched by a committed delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountChange {
    pub address: Address,
    /// `None` is a tombstone: the account no longer has restrictions.
    pub restrictions: Option<AccountRestrictions>,
}

impl AccountChange {
    pub fn is_tombstone(&self) -> bool {
        self.restrictions.is_none()
    }
}

/// Everything a commit changed, in first-touch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedDelta {
    /// Committed version after this delta (monotonic, starts at 1).
    pub version: u64,
    pub changes: Vec<AccountChange>,
}

impl CommittedDelta {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Pending layer. `None` entries are removal markers.
#[derive(Debug, Default)]
struct DeltaLayer {
    entries: HashMap<Address, Option<AccountRestrictions>>,
    touched: Vec<Address>,
}

impl DeltaLayer {
    fn visible<'a>(
        &'a self,
        base: &'a AccountMap,
        address: &Address,
    ) -> Option<&'a AccountRestrictions> {
        match self.entries.get(address) {
            Some(entry) => entry.as_ref(),
            None => base.get(address),
        }
    }

    /// Mutable copy of the account inside this layer.
    ///
    /// Materialized from base on first touch; created empty when absent or
    /// previously removed in this layer.
    fn working_copy(&mut self, base: &AccountMap, address: &Address) -> &mut AccountRestrictions {
        let entry = match self.entries.entry(*address) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                self.touched.push(*address);
                vacant.insert(base.get(address).cloned())
            }
        };
        entry.get_or_insert_with(|| AccountRestrictions::new(*address))
    }

    fn mark_removed(&mut self, address: &Address) {
        self.entries.insert(*address, None);
    }
}

struct CacheState {
    base: Arc<AccountMap>,
    delta: Option<DeltaLayer>,
    version: u64,
}

/// Immutable view of committed state at one version.
#[derive(Clone)]
pub struct CacheSnapshot {
    base: Arc<AccountMap>,
    version: u64,
}

impl CacheSnapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.base.contains_key(address)
    }

    /// Every committed account, in no particular order.
    pub fn accounts(&self) -> impl Iterator<Item = &AccountRestrictions> + '_ {
        self.base.values()
    }
}

impl RestrictionStateView for CacheSnapshot {
    fn find(&self, address: &Address) -> Option<AccountRestrictions> {
        self.base.get(address).cloned()
    }
}

/// The authoritative in-memory restriction state.
pub struct AccountRestrictionCache {
    limits: RestrictionLimits,
    state: RwLock<CacheState>,
}

impl AccountRestrictionCache {
    pub fn new(limits: RestrictionLimits) -> Self {
        Self {
            limits,
            state: RwLock::new(CacheState {
                base: Arc::new(HashMap::new()),
                delta: None,
                version: 0,
            }),
        }
    }

    pub fn limits(&self) -> &RestrictionLimits {
        &self.limits
    }

    /// Version of the last commit (0 before any commit).
    pub fn committed_version(&self) -> u64 {
        self.state.read().version
    }

    /// Number of committed accounts.
    pub fn committed_len(&self) -> usize {
        self.state.read().base.len()
    }

    pub fn has_open_delta(&self) -> bool {
        self.state.read().delta.is_some()
    }

    /// Accounts touched by the open delta.
    pub fn pending_accounts(&self) -> usize {
        self.state
            .read()
            .delta
            .as_ref()
            .map_or(0, |delta| delta.touched.len())
    }

    /// Snapshot of committed state; never observes a delta.
    pub fn snapshot(&self) -> CacheSnapshot {
        let state = self.state.read();
        CacheSnapshot {
            base: Arc::clone(&state.base),
            version: state.version,
        }
    }

    /// Begins the pending layer.
    pub fn open_delta(&self) -> Result<(), CacheError> {
        let mut state = self.state.write();
        if state.delta.is_some() {
            return Err(CacheError::DeltaAlreadyOpen);
        }
        state.delta = Some(DeltaLayer::default());
        debug!(version = state.version, "Opened restriction delta");
        Ok(())
    }

    /// Adds `value` to the account's `flags` set inside the open delta.
    ///
    /// Creates the account and set on demand. Fails without side effects if
    /// the value set would reject the value.
    pub fn apply_add(
        &self,
        address: &Address,
        flags: RestrictionFlags,
        value: RestrictionValue,
    ) -> Result<CacheMutation, CacheError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let delta = state.delta.as_mut().ok_or(CacheError::NoOpenDelta)?;

        let visible = delta.visible(&state.base, address);
        let account_created = visible.is_none();
        let existing_set = visible.and_then(|account| account.set(&flags));
        let set_created = existing_set.is_none();
        match existing_set {
            Some(set) => set.check_add(&value)?,
            None => RestrictionValueSet::new(flags, self.limits.max_values(flags.kind()))
                .check_add(&value)?,
        }

        delta
            .working_copy(&state.base, address)
            .get_or_create_set(flags, &self.limits)
            .try_add(value)?;

        Ok(CacheMutation {
            address: *address,
            flags,
            value,
            action: MutationAction::Add,
            account_created,
            set_created,
            set_removed: false,
            account_removed: false,
        })
    }

    /// Removes `value` from the account's `flags` set inside the open delta.
    ///
    /// Prunes the set when it empties and drops the account when its last
    /// set is gone. Fails without side effects if the value is absent.
    pub fn apply_remove(
        &self,
        address: &Address,
        flags: RestrictionFlags,
        value: RestrictionValue,
    ) -> Result<CacheMutation, CacheError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let delta = state.delta.as_mut().ok_or(CacheError::NoOpenDelta)?;

        delta
            .visible(&state.base, address)
            .and_then(|account| account.set(&flags))
            .ok_or(ValueSetError::NotPresent { value })?
            .check_remove(&value)?;

        let account = delta.working_copy(&state.base, address);
        account
            .set_mut(&flags)
            .ok_or(ValueSetError::NotPresent { value })?
            .try_remove(&value)?;
        let set_removed = !account.prune_empty().is_empty();
        let account_removed = account.is_empty();
        if account_removed {
            delta.mark_removed(address);
        }

        Ok(CacheMutation {
            address: *address,
            flags,
            value,
            action: MutationAction::Remove,
            account_created: false,
            set_created: false,
            set_removed,
            account_removed,
        })
    }

    /// Merges the delta into base and clears it.
    pub fn commit(&self) -> Result<CommittedDelta, CacheError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let DeltaLayer {
            mut entries,
            touched,
        } = state.delta.take().ok_or(CacheError::NoOpenDelta)?;

        let base = Arc::make_mut(&mut state.base);
        let mut changes = Vec::with_capacity(touched.len());
        for address in touched {
            let Some(entry) = entries.remove(&address) else {
                continue;
            };
            match &entry {
                Some(account) => {
                    base.insert(address, account.clone());
                }
                None => {
                    base.remove(&address);
                }
            }
            changes.push(AccountChange {
                address,
                restrictions: entry,
            });
        }
        state.version += 1;

        info!(
            version = state.version,
            touched = changes.len(),
            accounts = base.len(),
            "Committed restriction delta"
        );

        Ok(CommittedDelta {
            version: state.version,
            changes,
        })
    }

    /// Discards the delta; base is unchanged.
    pub fn rollback(&self) -> Result<(), CacheError> {
        let mut state = self.state.write();
        let delta = state.delta.take().ok_or(CacheError::NoOpenDelta)?;
        info!(
            version = state.version,
            discarded = delta.touched.len(),
            "Rolled back restriction delta"
        );
        Ok(())
    }

    /// Installs cold-loaded accounts as the committed base.
    ///
    /// Only valid on an empty cache with no open delta. Empty accounts are
    /// skipped. Returns the number of accounts installed.
    pub fn restore_base<I>(&self, accounts: I) -> Result<usize, CacheError>
    where
        I: IntoIterator<Item = AccountRestrictions>,
    {
        let mut guard = self.state.write();
        let state = &mut *guard;
        if state.delta.is_some() {
            return Err(CacheError::DeltaAlreadyOpen);
        }
        if !state.base.is_empty() {
            return Err(CacheError::BaseNotEmpty {
                accounts: state.base.len(),
            });
        }

        let base = Arc::make_mut(&mut state.base);
        for account in accounts.into_iter().filter(|a| !a.is_empty()) {
            debug!(account = %address_to_hex(account.address()), sets = account.len(), "Restored account restrictions");
            base.insert(*account.address(), account);
        }
        Ok(base.len())
    }
}

impl RestrictionStateView for AccountRestrictionCache {
    fn find(&self, address: &Address) -> Option<AccountRestrictions> {
        let state = self.state.read();
        match &state.delta {
            Some(delta) => delta.visible(&state.base, address).cloned(),
            None => state.base.get(address).cloned(),
        }
    }
}
