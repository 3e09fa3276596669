//! Restriction values: the members of a restriction value set.

use super::flags::RestrictionValueKind;
use shared_types::{
    address_from_hex, address_to_hex, entity_types, Address, EntityType, MosaicId, ParseError,
};
use std::fmt;

/// One restricted value, tagged with its kind.
///
/// Ordering is only meaningful between values of the same kind, which is all
/// a value set ever compares: addresses order bytewise, mosaics and
/// operations numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RestrictionValue {
    Address(Address),
    Mosaic(MosaicId),
    Operation(EntityType),
}

impl RestrictionValue {
    pub const fn kind(&self) -> RestrictionValueKind {
        match self {
            Self::Address(_) => RestrictionValueKind::Address,
            Self::Mosaic(_) => RestrictionValueKind::Mosaic,
            Self::Operation(_) => RestrictionValueKind::Operation,
        }
    }

    /// Fixed-width big-endian hex encoding.
    ///
    /// Lexicographic order of the encoding matches value order, so a sorted
    /// value list stays sorted once encoded.
    pub fn to_hex(&self) -> String {
        match self {
            Self::Address(address) => address_to_hex(address),
            Self::Mosaic(mosaic) => format!("{:016X}", mosaic.0),
            Self::Operation(entity_type) => format!("{:04X}", entity_type.0),
        }
    }

    /// Decodes a value of the given kind from its hex encoding.
    pub fn from_hex(kind: RestrictionValueKind, text: &str) -> Result<Self, ParseError> {
        let expected = kind.value_size();
        if text.len() != expected * 2 {
            return Err(ParseError::InvalidLength {
                expected,
                actual: text.len() / 2,
            });
        }
        if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseError::InvalidHex(text.to_string()));
        }

        match kind {
            RestrictionValueKind::Address => address_from_hex(text).map(Self::Address),
            RestrictionValueKind::Mosaic => u64::from_str_radix(text, 16)
                .map(|raw| Self::Mosaic(MosaicId(raw)))
                .map_err(|e| ParseError::InvalidHex(e.to_string())),
            RestrictionValueKind::Operation => u16::from_str_radix(text, 16)
                .map(|raw| Self::Operation(EntityType(raw)))
                .map_err(|e| ParseError::InvalidHex(e.to_string())),
        }
    }
}

impl fmt::Display for RestrictionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => write!(f, "address:{}", address_to_hex(address)),
            Self::Mosaic(mosaic) => write!(f, "mosaic:{}", mosaic),
            Self::Operation(entity_type) => write!(f, "operation:{}", entity_type),
        }
    }
}

impl From<Address> for RestrictionValue {
    fn from(address: Address) -> Self {
        Self::Address(address)
    }
}

impl From<MosaicId> for RestrictionValue {
    fn from(mosaic: MosaicId) -> Self {
        Self::Mosaic(mosaic)
    }
}

impl From<EntityType> for RestrictionValue {
    fn from(entity_type: EntityType) -> Self {
        Self::Operation(entity_type)
    }
}

/// Typed value carried by one of the three restriction transaction shapes.
pub trait RestrictionValueType: Copy + Into<RestrictionValue> {
    /// Kind of restriction set this value type populates.
    const KIND: RestrictionValueKind;

    /// Transaction type code of the transaction carrying this value type.
    const TRANSACTION_TYPE: EntityType;
}

impl RestrictionValueType for Address {
    const KIND: RestrictionValueKind = RestrictionValueKind::Address;
    const TRANSACTION_TYPE: EntityType = entity_types::ACCOUNT_ADDRESS_RESTRICTION;
}

impl RestrictionValueType for MosaicId {
    const KIND: RestrictionValueKind = RestrictionValueKind::Mosaic;
    const TRANSACTION_TYPE: EntityType = entity_types::ACCOUNT_MOSAIC_RESTRICTION;
}

impl RestrictionValueType for EntityType {
    const KIND: RestrictionValueKind = RestrictionValueKind::Operation;
    const TRANSACTION_TYPE: EntityType = entity_types::ACCOUNT_OPERATION_RESTRICTION;
}
