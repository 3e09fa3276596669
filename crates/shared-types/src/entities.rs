//! # Core Domain Entities
//!
//! Identifiers referenced by account restrictions.
//!
//! ## Clusters
//!
//! - **Accounts**: `Address`, `NetworkIdentifier`
//! - **Assets**: `MosaicId`
//! - **Operations**: `EntityType` and the well-known transaction type codes

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: ACCOUNTS
// =============================================================================

/// Width of an account address in bytes.
pub const ADDRESS_SIZE: usize = 24;

/// A 24-byte account address.
///
/// The first byte is the network identifier the address belongs to.
pub type Address = [u8; ADDRESS_SIZE];

/// Block height in the chain.
pub type Height = u64;

/// One-byte network discriminator carried as the first address byte.
pub type NetworkIdentifier = u8;

/// Well-known network identifiers.
pub mod networks {
    use super::NetworkIdentifier;

    pub const MAINNET: NetworkIdentifier = 0x68;
    pub const TESTNET: NetworkIdentifier = 0x98;
}

/// The all-zero address. Never a valid account.
pub const ZERO_ADDRESS: Address = [0u8; ADDRESS_SIZE];

/// Returns the network identifier encoded in an address.
#[inline]
pub fn address_network(address: &Address) -> NetworkIdentifier {
    address[0]
}

/// Encodes an address as upper-case hex (the form used in documents and logs).
pub fn address_to_hex(address: &Address) -> String {
    hex::encode_upper(address)
}

/// Decodes an address from hex.
pub fn address_from_hex(text: &str) -> Result<Address, ParseError> {
    let bytes = hex::decode(text).map_err(|e| ParseError::InvalidHex(e.to_string()))?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| ParseError::InvalidLength {
        expected: ADDRESS_SIZE,
        actual,
    })
}

// =============================================================================
// CLUSTER B: ASSETS
// =============================================================================

/// An 8-byte mosaic (asset) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct MosaicId(pub u64);

impl MosaicId {
    /// Serialized width in bytes.
    pub const SIZE: usize = 8;
}

impl fmt::Display for MosaicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

// =============================================================================
// CLUSTER C: OPERATIONS
// =============================================================================

/// A 2-byte transaction type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct EntityType(pub u16);

impl EntityType {
    /// Serialized width in bytes.
    pub const SIZE: usize = 2;
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// Well-known transaction type codes.
pub mod entity_types {
    use super::EntityType;

    pub const TRANSFER: EntityType = EntityType(0x4154);
    pub const MOSAIC_DEFINITION: EntityType = EntityType(0x414D);
    pub const MOSAIC_SUPPLY_CHANGE: EntityType = EntityType(0x424D);
    pub const ACCOUNT_ADDRESS_RESTRICTION: EntityType = EntityType(0x4150);
    pub const ACCOUNT_MOSAIC_RESTRICTION: EntityType = EntityType(0x4250);
    pub const ACCOUNT_OPERATION_RESTRICTION: EntityType = EntityType(0x4350);
}
