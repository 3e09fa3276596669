//! # Account Restrictions
//!
//! All restriction value sets owned by one account, keyed by flags.
//!
//! An `AccountRestrictions` lives in the cache only while it owns at least
//! one non-empty set. Sets emptied by a removal are pruned immediately, and
//! the cache drops the account once its last set is gone.

use super::config::RestrictionLimits;
use super::flags::{Direction, RestrictionFlags, RestrictionValueKind};
use super::value_set::RestrictionValueSet;
use shared_types::{address_to_hex, Address};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRestrictions {
    address: Address,
    sets: BTreeMap<RestrictionFlags, RestrictionValueSet>,
}

impl AccountRestrictions {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            sets: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// True when no set is owned; such an account must not stay cached.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Number of owned sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Total values across all owned sets.
    pub fn value_count(&self) -> usize {
        self.sets.values().map(RestrictionValueSet::len).sum()
    }

    pub fn set(&self, flags: &RestrictionFlags) -> Option<&RestrictionValueSet> {
        self.sets.get(flags)
    }

    pub fn set_mut(&mut self, flags: &RestrictionFlags) -> Option<&mut RestrictionValueSet> {
        self.sets.get_mut(flags)
    }

    /// Owned sets in canonical flag order.
    pub fn sets(&self) -> impl Iterator<Item = &RestrictionValueSet> + '_ {
        self.sets.values()
    }

    /// The non-empty set for `(kind, direction)`, whichever polarity it has.
    pub fn active_set(
        &self,
        kind: RestrictionValueKind,
        direction: Direction,
    ) -> Option<&RestrictionValueSet> {
        self.sets
            .values()
            .find(|set| {
                let flags = set.flags();
                flags.kind() == kind && flags.direction() == direction && !set.is_empty()
            })
    }

    /// Returns the set for `flags`, creating an empty one sized by `limits`.
    pub fn get_or_create_set(
        &mut self,
        flags: RestrictionFlags,
        limits: &RestrictionLimits,
    ) -> &mut RestrictionValueSet {
        self.sets
            .entry(flags)
            .or_insert_with(|| RestrictionValueSet::new(flags, limits.max_values(flags.kind())))
    }

    /// Installs a fully built set (cold load). Empty sets are ignored.
    pub fn insert_set(&mut self, set: RestrictionValueSet) {
        if !set.is_empty() {
            self.sets.insert(set.flags(), set);
        }
    }

    /// Drops every empty set and returns the flags that were dropped.
    pub fn prune_empty(&mut self) -> Vec<RestrictionFlags> {
        let empty: Vec<RestrictionFlags> = self
            .sets
            .iter()
            .filter(|(_, set)| set.is_empty())
            .map(|(flags, _)| *flags)
            .collect();
        for flags in &empty {
            self.sets.remove(flags);
        }
        empty
    }

    pub fn address_hex(&self) -> String {
        address_to_hex(&self.address)
    }
}
