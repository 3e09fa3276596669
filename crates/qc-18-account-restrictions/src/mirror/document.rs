//! Document form of one account's restrictions.
//!
//! ```json
//! {
//!   "account": "98A1...",
//!   "restrictions": [
//!     { "kind": "address", "polarity": "block", "direction": "outgoing",
//!       "values": ["98B0...", "98C0..."] }
//!   ]
//! }
//! ```
//!
//! Sets appear in flag order and values in their canonical set order, so
//! equal restrictions always serialize to equal documents.

use super::MirrorError;
use crate::domain::{
    AccountRestrictions, Direction, Polarity, RestrictionFlags, RestrictionLimits,
    RestrictionValue, RestrictionValueKind, RestrictionValueSet,
};
use serde::{Deserialize, Serialize};
use shared_types::{address_from_hex, address_to_hex, Address, ParseError};

/// One value set inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionSetDocument {
    pub kind: RestrictionValueKind,
    pub polarity: Polarity,
    pub direction: Direction,
    /// Fixed-width upper-case hex, canonically ordered.
    pub values: Vec<String>,
}

/// Mirror document keyed by account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionDocument {
    pub account: String,
    pub restrictions: Vec<RestrictionSetDocument>,
}

impl RestrictionDocument {
    pub fn address(&self) -> Result<Address, ParseError> {
        address_from_hex(&self.account)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Decodes the document, sizing each set by `limits`.
    ///
    /// Rejects documents that could never have been written from valid
    /// state: no sets, empty sets, repeated flags, values of the wrong kind
    /// or width, and sets larger than the configured limit.
    pub fn into_restrictions(
        self,
        limits: &RestrictionLimits,
    ) -> Result<AccountRestrictions, MirrorError> {
        let malformed = |reason: String| MirrorError::MalformedDocument {
            account: self.account.clone(),
            reason,
        };

        let address = self.address().map_err(|err| malformed(err.to_string()))?;
        if self.restrictions.is_empty() {
            return Err(malformed("document holds no restriction sets".into()));
        }

        let mut account = AccountRestrictions::new(address);
        for set_doc in &self.restrictions {
            let flags = RestrictionFlags::new(set_doc.kind, set_doc.polarity, set_doc.direction)
                .map_err(|err| malformed(err.to_string()))?;
            if set_doc.values.is_empty() {
                return Err(malformed(format!("empty value set {flags}")));
            }
            if account.set(&flags).is_some() {
                return Err(malformed(format!("repeated value set {flags}")));
            }

            let values = set_doc
                .values
                .iter()
                .map(|text| RestrictionValue::from_hex(flags.kind(), text))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| malformed(err.to_string()))?;
            let set =
                RestrictionValueSet::from_values(flags, limits.max_values(flags.kind()), values)
                    .map_err(|err| malformed(format!("{flags}: {err}")))?;
            account.insert_set(set);
        }
        Ok(account)
    }
}

impl From<&AccountRestrictions> for RestrictionDocument {
    fn from(account: &AccountRestrictions) -> Self {
        Self {
            account: address_to_hex(account.address()),
            restrictions: account
                .sets()
                .filter(|set| !set.is_empty())
                .map(|set| {
                    let flags = set.flags();
                    RestrictionSetDocument {
                        kind: flags.kind(),
                        polarity: flags.polarity(),
                        direction: flags.direction(),
                        values: set.iter().map(RestrictionValue::to_hex).collect(),
                    }
                })
                .collect(),
        }
    }
}
