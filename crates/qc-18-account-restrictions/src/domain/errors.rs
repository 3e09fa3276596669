//! # Domain Errors
//!
//! Error types for the account restriction engine.
//!
//! ## Layers
//!
//! | Layer | Type | Recoverable |
//! |-------|------|-------------|
//! | Flag decoding | `FlagsError` | yes (input rejected) |
//! | Value set | `ValueSetError` | no past the validator |
//! | Cache | `CacheError` | programming error |
//! | Validation | `ValidationFailure` | yes (transaction rejected) |
//! | Observer | `ObserverError` | no (validator/observer desync) |
//! | Policy | `PolicyFailure` | yes (dependent transaction rejected) |

use super::flags::{RestrictionFlags, RestrictionValueKind};
use super::values::RestrictionValue;
use thiserror::Error;

/// Errors decoding or constructing restriction flags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagsError {
    #[error("Unknown restriction flag bits: 0x{0:04X}")]
    UnknownBits(u16),

    #[error("Restriction flags 0x{0:04X} name no value kind")]
    MissingKind(u16),

    #[error("Restriction flags 0x{0:04X} name more than one value kind")]
    MultipleKinds(u16),

    #[error("{kind} restrictions only support the outgoing direction")]
    IncomingNotSupported { kind: RestrictionValueKind },
}

/// Membership errors at the value-set layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueSetError {
    #[error("Value {value} already present")]
    AlreadyPresent { value: RestrictionValue },

    #[error("Value {value} not present")]
    NotPresent { value: RestrictionValue },

    #[error("Capacity exceeded: set already holds {max_size} values")]
    CapacityExceeded { max_size: usize },

    #[error("Value kind {actual} does not match set kind {expected}")]
    KindMismatch {
        expected: RestrictionValueKind,
        actual: RestrictionValueKind,
    },
}

/// Errors raised by the versioned cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("A delta layer is already open")]
    DeltaAlreadyOpen,

    #[error("No delta layer is open")]
    NoOpenDelta,

    #[error("Committed base already holds {accounts} accounts")]
    BaseNotEmpty { accounts: usize },

    #[error("Value set error: {0}")]
    ValueSet(#[from] ValueSetError),
}

/// Reasons a restriction transaction is rejected.
///
/// Variants are listed in the order the validator checks them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("Invalid restriction flags: {reason}")]
    InvalidRestrictionFlags { reason: String },

    #[error("Duplicate modification of value {value}")]
    DuplicateModification { value: RestrictionValue },

    #[error("Invalid modification value {value}: {reason}")]
    InvalidModificationValue {
        value: RestrictionValue,
        reason: &'static str,
    },

    #[error("Redundant modification of value {value}")]
    RedundantModification { value: RestrictionValue },

    #[error("Conflicting polarity: account still holds a non-empty {existing} set")]
    ConflictingPolarity { existing: RestrictionFlags },

    #[error("Modification count exceeded: {resulting} values, max {max_size}")]
    ModificationCountExceeded { resulting: usize, max_size: usize },

    #[error("Invalid modifications count: {count}, allowed 1..={max}")]
    InvalidModificationsCount { count: usize, max: usize },
}

/// Fatal errors while applying or undoing a validated transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    #[error("Cache error: {0}")]
    Cache(CacheError),

    #[error("Validator/observer desynchronized on {account} {flags} {value}: {source}")]
    Desynchronized {
        account: String,
        flags: RestrictionFlags,
        value: RestrictionValue,
        source: ValueSetError,
    },
}

/// A dependent transaction is blocked by an account restriction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyFailure {
    #[error("Address interaction prohibited between {source_account} and {recipient}")]
    AddressInteractionProhibited {
        source_account: String,
        recipient: String,
    },

    #[error("Mosaic {mosaic} transfer prohibited for {account}")]
    MosaicTransferProhibited { account: String, mosaic: String },

    #[error("Operation type {entity_type} prohibited for {account}")]
    OperationTypeProhibited {
        account: String,
        entity_type: String,
    },
}
