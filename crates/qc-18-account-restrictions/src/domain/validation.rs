//! # Restriction Transaction Validation
//!
//! One algorithm for all three transaction shapes, parameterized by the
//! value kind carried in the flags.
//!
//! ## Check Order
//!
//! | # | Failure | Needs state |
//! |---|---------|-------------|
//! | 0 | `InvalidRestrictionFlags` | no |
//! | 1 | `DuplicateModification` | no |
//! | 2 | `InvalidModificationValue` | no |
//! | 3 | `RedundantModification` | yes |
//! | 3b | `ConflictingPolarity` | yes |
//! | 4 | `ModificationCountExceeded` | yes |
//! | 5 | `InvalidModificationsCount` | no |
//!
//! Validation never mutates state. It reads whatever view it is given: the
//! live cache (delta overlaid) during block execution, or a committed
//! snapshot for speculative validation.

use super::cache::RestrictionStateView;
use super::config::{RestrictionConfig, RestrictionLimits};
use super::errors::ValidationFailure;
use super::flags::{Polarity, RestrictionFlags};
use super::transactions::RestrictionModification;
use super::values::RestrictionValue;
use shared_types::{address_network, entity_types, Address, NetworkIdentifier, ZERO_ADDRESS};
use std::collections::HashSet;

/// Stateless rule set applied to restriction transactions.
#[derive(Debug, Clone)]
pub struct RestrictionValidator {
    network_identifier: NetworkIdentifier,
    limits: RestrictionLimits,
    max_modifications: usize,
}

impl RestrictionValidator {
    pub fn new(config: &RestrictionConfig) -> Self {
        Self {
            network_identifier: config.network_identifier,
            limits: config.limits,
            max_modifications: config.max_modifications_per_transaction,
        }
    }

    /// Validates `modification` against `view`.
    pub fn validate<S>(
        &self,
        modification: &RestrictionModification,
        view: &S,
    ) -> Result<(), ValidationFailure>
    where
        S: RestrictionStateView + ?Sized,
    {
        check_value_kinds(modification)?;
        check_duplicates(modification)?;
        for value in modification.additions.iter().chain(&modification.deletions) {
            self.check_value(&modification.account, modification.flags, value)?;
        }

        let account = view.find(&modification.account);
        let current = account.as_ref().and_then(|a| a.set(&modification.flags));

        for value in &modification.additions {
            if current.is_some_and(|set| set.contains(value)) {
                return Err(ValidationFailure::RedundantModification { value: *value });
            }
        }
        for value in &modification.deletions {
            if !current.is_some_and(|set| set.contains(value)) {
                return Err(ValidationFailure::RedundantModification { value: *value });
            }
        }

        if !modification.additions.is_empty() {
            let opposite = modification.flags.opposite();
            if account
                .as_ref()
                .and_then(|a| a.set(&opposite))
                .is_some_and(|set| !set.is_empty())
            {
                return Err(ValidationFailure::ConflictingPolarity { existing: opposite });
            }
        }

        // Deletions are all present (checked above), so this cannot underflow.
        let resulting = current.map_or(0, |set| set.len()) - modification.deletions.len()
            + modification.additions.len();
        let max_size = self.limits.max_values(modification.flags.kind());
        if resulting > max_size {
            return Err(ValidationFailure::ModificationCountExceeded {
                resulting,
                max_size,
            });
        }

        let count = modification.modification_count();
        if count == 0 || count > self.max_modifications {
            return Err(ValidationFailure::InvalidModificationsCount {
                count,
                max: self.max_modifications,
            });
        }

        Ok(())
    }

    /// Kind-specific value rules.
    fn check_value(
        &self,
        account: &Address,
        flags: RestrictionFlags,
        value: &RestrictionValue,
    ) -> Result<(), ValidationFailure> {
        let reason = match value {
            RestrictionValue::Address(address) if address == account => {
                Some("account cannot restrict itself")
            }
            RestrictionValue::Address(address) if *address == ZERO_ADDRESS => {
                Some("reserved address")
            }
            RestrictionValue::Address(address)
                if address_network(address) != self.network_identifier =>
            {
                Some("address belongs to another network")
            }
            RestrictionValue::Mosaic(mosaic) if mosaic.0 == 0 => Some("reserved mosaic id"),
            RestrictionValue::Operation(entity_type) if entity_type.0 == 0 => {
                Some("unknown transaction type")
            }
            RestrictionValue::Operation(entity_type)
                if *entity_type == entity_types::ACCOUNT_OPERATION_RESTRICTION
                    && flags.polarity() == Polarity::Block =>
            {
                Some("operation restrictions cannot block themselves")
            }
            _ => None,
        };

        match reason {
            Some(reason) => Err(ValidationFailure::InvalidModificationValue {
                value: *value,
                reason,
            }),
            None => Ok(()),
        }
    }
}

fn check_value_kinds(modification: &RestrictionModification) -> Result<(), ValidationFailure> {
    let expected = modification.flags.kind();
    match modification
        .additions
        .iter()
        .chain(&modification.deletions)
        .find(|value| value.kind() != expected)
    {
        Some(value) => Err(ValidationFailure::InvalidRestrictionFlags {
            reason: format!("{} value in a {} restriction", value.kind(), expected),
        }),
        None => Ok(()),
    }
}

fn check_duplicates(modification: &RestrictionModification) -> Result<(), ValidationFailure> {
    let mut additions = HashSet::with_capacity(modification.additions.len());
    for value in &modification.additions {
        if !additions.insert(value) {
            return Err(ValidationFailure::DuplicateModification { value: *value });
        }
    }

    let mut deletions = HashSet::with_capacity(modification.deletions.len());
    for value in &modification.deletions {
        if !deletions.insert(value) || additions.contains(value) {
            return Err(ValidationFailure::DuplicateModification { value: *value });
        }
    }
    Ok(())
}
