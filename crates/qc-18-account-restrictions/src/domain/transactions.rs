//! Restriction transaction payloads.
//!
//! The pipeline delivers one of three typed shapes (address, mosaic,
//! operation). Each converts into a kind-tagged [`RestrictionModification`],
//! which is the only form the validator and observer operate on.

use super::flags::RestrictionFlags;
use super::values::{RestrictionValue, RestrictionValueType};
use shared_types::{Address, EntityType, MosaicId};

/// A typed restriction transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRestrictionTransaction<V> {
    /// Account whose restrictions are modified (the transaction signer).
    pub account: Address,
    pub flags: RestrictionFlags,
    pub additions: Vec<V>,
    pub deletions: Vec<V>,
}

pub type AccountAddressRestrictionTransaction = AccountRestrictionTransaction<Address>;
pub type AccountMosaicRestrictionTransaction = AccountRestrictionTransaction<MosaicId>;
pub type AccountOperationRestrictionTransaction = AccountRestrictionTransaction<EntityType>;

impl<V: RestrictionValueType> AccountRestrictionTransaction<V> {
    pub fn new(account: Address, flags: RestrictionFlags) -> Self {
        Self {
            account,
            flags,
            additions: Vec::new(),
            deletions: Vec::new(),
        }
    }

    pub fn with_additions(mut self, additions: impl IntoIterator<Item = V>) -> Self {
        self.additions.extend(additions);
        self
    }

    pub fn with_deletions(mut self, deletions: impl IntoIterator<Item = V>) -> Self {
        self.deletions.extend(deletions);
        self
    }

    /// Transaction type code of this shape.
    pub fn entity_type(&self) -> EntityType {
        V::TRANSACTION_TYPE
    }
}

/// Kind-tagged modification of one account's restriction set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionModification {
    pub account: Address,
    pub flags: RestrictionFlags,
    /// Values to add, in transaction order.
    pub additions: Vec<RestrictionValue>,
    /// Values to remove, in transaction order.
    pub deletions: Vec<RestrictionValue>,
}

impl RestrictionModification {
    /// Total add+remove entries.
    pub fn modification_count(&self) -> usize {
        self.additions.len() + self.deletions.len()
    }
}

impl<V: RestrictionValueType> From<AccountRestrictionTransaction<V>> for RestrictionModification {
    fn from(tx: AccountRestrictionTransaction<V>) -> Self {
        Self {
            account: tx.account,
            flags: tx.flags,
            additions: tx.additions.into_iter().map(Into::into).collect(),
            deletions: tx.deletions.into_iter().map(Into::into).collect(),
        }
    }
}
