//! # Restriction Flags
//!
//! The composite descriptor `(kind, polarity, direction)` that keys every
//! restriction value set.
//!
//! ## Wire Form
//!
//! | Bit | Meaning |
//! |-----|---------|
//! | `0x0001` | Address values |
//! | `0x0002` | Mosaic values |
//! | `0x0004` | Operation (transaction type) values |
//! | `0x4000` | Outgoing direction (absent = incoming) |
//! | `0x8000` | Block list (absent = allow list) |
//!
//! Mosaic and operation restrictions are outgoing-only; only address
//! restrictions may govern incoming interactions.

use super::errors::FlagsError;
use serde::{Deserialize, Serialize};
use shared_types::{EntityType, MosaicId, ADDRESS_SIZE};
use std::fmt;

/// Class of value a restriction set holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestrictionValueKind {
    Address,
    Mosaic,
    Operation,
}

impl RestrictionValueKind {
    pub const ALL: [RestrictionValueKind; 3] = [Self::Address, Self::Mosaic, Self::Operation];

    /// Flag bit naming this kind.
    pub const fn flag_bit(self) -> u16 {
        match self {
            Self::Address => 0x0001,
            Self::Mosaic => 0x0002,
            Self::Operation => 0x0004,
        }
    }

    /// Serialized width of one value of this kind.
    pub const fn value_size(self) -> usize {
        match self {
            Self::Address => ADDRESS_SIZE,
            Self::Mosaic => MosaicId::SIZE,
            Self::Operation => EntityType::SIZE,
        }
    }

    /// Whether restrictions of this kind may govern incoming interactions.
    pub const fn supports_incoming(self) -> bool {
        matches!(self, Self::Address)
    }
}

impl fmt::Display for RestrictionValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => write!(f, "address"),
            Self::Mosaic => write!(f, "mosaic"),
            Self::Operation => write!(f, "operation"),
        }
    }
}

/// Allow-list vs block-list semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Allow,
    Block,
}

impl Polarity {
    pub const fn opposite(self) -> Self {
        match self {
            Self::Allow => Self::Block,
            Self::Block => Self::Allow,
        }
    }
}

/// Whether a restriction governs the account's own actions or what it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

const OUTGOING_BIT: u16 = 0x4000;
const BLOCK_BIT: u16 = 0x8000;
const KIND_MASK: u16 = 0x0007;
const KNOWN_BITS: u16 = KIND_MASK | OUTGOING_BIT | BLOCK_BIT;

/// Composite restriction descriptor.
///
/// Only valid combinations can be constructed: incoming mosaic or operation
/// restrictions are rejected by [`RestrictionFlags::new`] and
/// [`RestrictionFlags::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RestrictionFlags {
    kind: RestrictionValueKind,
    polarity: Polarity,
    direction: Direction,
}

impl RestrictionFlags {
    pub fn new(
        kind: RestrictionValueKind,
        polarity: Polarity,
        direction: Direction,
    ) -> Result<Self, FlagsError> {
        if direction == Direction::Incoming && !kind.supports_incoming() {
            return Err(FlagsError::IncomingNotSupported { kind });
        }
        Ok(Self {
            kind,
            polarity,
            direction,
        })
    }

    /// Address restriction in either direction.
    pub const fn address(polarity: Polarity, direction: Direction) -> Self {
        Self {
            kind: RestrictionValueKind::Address,
            polarity,
            direction,
        }
    }

    /// Outgoing mosaic restriction.
    pub const fn mosaic(polarity: Polarity) -> Self {
        Self {
            kind: RestrictionValueKind::Mosaic,
            polarity,
            direction: Direction::Outgoing,
        }
    }

    /// Outgoing operation restriction.
    pub const fn operation(polarity: Polarity) -> Self {
        Self {
            kind: RestrictionValueKind::Operation,
            polarity,
            direction: Direction::Outgoing,
        }
    }

    pub const fn kind(&self) -> RestrictionValueKind {
        self.kind
    }

    pub const fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Same kind and direction with the other polarity.
    pub const fn opposite(&self) -> Self {
        Self {
            kind: self.kind,
            polarity: self.polarity.opposite(),
            direction: self.direction,
        }
    }

    /// Encodes the flags in their u16 wire form.
    pub const fn raw(&self) -> u16 {
        let mut raw = self.kind.flag_bit();
        if matches!(self.direction, Direction::Outgoing) {
            raw |= OUTGOING_BIT;
        }
        if matches!(self.polarity, Polarity::Block) {
            raw |= BLOCK_BIT;
        }
        raw
    }

    /// Decodes flags from their u16 wire form.
    pub fn from_raw(raw: u16) -> Result<Self, FlagsError> {
        if raw & !KNOWN_BITS != 0 {
            return Err(FlagsError::UnknownBits(raw & !KNOWN_BITS));
        }

        let kind = match raw & KIND_MASK {
            0 => return Err(FlagsError::MissingKind(raw)),
            0x0001 => RestrictionValueKind::Address,
            0x0002 => RestrictionValueKind::Mosaic,
            0x0004 => RestrictionValueKind::Operation,
            _ => return Err(FlagsError::MultipleKinds(raw)),
        };
        let direction = if raw & OUTGOING_BIT != 0 {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };
        let polarity = if raw & BLOCK_BIT != 0 {
            Polarity::Block
        } else {
            Polarity::Allow
        };

        Self::new(kind, polarity, direction)
    }
}

impl fmt::Display for RestrictionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:?}-{:?}",
            self.kind, self.polarity, self.direction
        )
    }
}
