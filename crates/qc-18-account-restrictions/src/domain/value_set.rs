//! # Restriction Value Set
//!
//! A bounded, deduplicated set of values of one kind, tagged with its flags.
//!
//! ## Invariants
//!
//! - Every value has the kind named by `flags`
//! - `len() <= max_size`; exceeding it is an error, never a truncation
//! - Iteration is in canonical ascending order

use super::errors::ValueSetError;
use super::flags::RestrictionFlags;
use super::values::RestrictionValue;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionValueSet {
    flags: RestrictionFlags,
    values: BTreeSet<RestrictionValue>,
    max_size: usize,
}

impl RestrictionValueSet {
    /// Creates an empty set.
    pub fn new(flags: RestrictionFlags, max_size: usize) -> Self {
        Self {
            flags,
            values: BTreeSet::new(),
            max_size,
        }
    }

    /// Builds a set from existing values (cold load).
    pub fn from_values<I>(
        flags: RestrictionFlags,
        max_size: usize,
        values: I,
    ) -> Result<Self, ValueSetError>
    where
        I: IntoIterator<Item = RestrictionValue>,
    {
        let mut set = Self::new(flags, max_size);
        for value in values {
            set.try_add(value)?;
        }
        Ok(set)
    }

    pub fn flags(&self) -> RestrictionFlags {
        self.flags
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &RestrictionValue) -> bool {
        self.values.contains(value)
    }

    /// Values in canonical ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &RestrictionValue> + '_ {
        self.values.iter()
    }

    /// Checks that `value` could be added without mutating the set.
    pub fn check_add(&self, value: &RestrictionValue) -> Result<(), ValueSetError> {
        if value.kind() != self.flags.kind() {
            return Err(ValueSetError::KindMismatch {
                expected: self.flags.kind(),
                actual: value.kind(),
            });
        }
        if self.values.contains(value) {
            return Err(ValueSetError::AlreadyPresent { value: *value });
        }
        if self.values.len() >= self.max_size {
            return Err(ValueSetError::CapacityExceeded {
                max_size: self.max_size,
            });
        }
        Ok(())
    }

    /// Checks that `value` could be removed without mutating the set.
    pub fn check_remove(&self, value: &RestrictionValue) -> Result<(), ValueSetError> {
        if !self.values.contains(value) {
            return Err(ValueSetError::NotPresent { value: *value });
        }
        Ok(())
    }

    pub fn try_add(&mut self, value: RestrictionValue) -> Result<(), ValueSetError> {
        self.check_add(&value)?;
        self.values.insert(value);
        Ok(())
    }

    pub fn try_remove(&mut self, value: &RestrictionValue) -> Result<(), ValueSetError> {
        self.check_remove(value)?;
        self.values.remove(value);
        Ok(())
    }
}
