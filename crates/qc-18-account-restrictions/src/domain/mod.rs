//! # Domain Layer - Account Restrictions
//!
//! Pure state-machine logic for restriction values.
//!
//! ## Components
//!
//! - `flags`: `RestrictionFlags` = (kind, polarity, direction) and its wire form
//! - `values`: `RestrictionValue` and the typed value trait
//! - `value_set`: bounded `RestrictionValueSet`
//! - `entities`: `AccountRestrictions` (all sets of one account)
//! - `cache`: versioned `AccountRestrictionCache` with delta layer and snapshots
//! - `transactions`: typed payloads and the kind-tagged `RestrictionModification`
//! - `validation`: `RestrictionValidator`
//! - `observer`: `RestrictionObserver` (apply / exact undo)
//! - `policy`: allow/block checks consumed by other validators
//! - `config`: `RestrictionConfig`, `RestrictionLimits`
//! - `errors`: error enumerations

pub mod cache;
pub mod config;
pub mod entities;
pub mod errors;
pub mod flags;
pub mod observer;
pub mod policy;
pub mod transactions;
pub mod validation;
pub mod value_set;
pub mod values;

pub use cache::*;
pub use config::*;
pub use entities::*;
pub use errors::*;
pub use flags::*;
pub use observer::*;
pub use policy::*;
pub use transactions::*;
pub use validation::*;
pub use value_set::*;
pub use values::*;
