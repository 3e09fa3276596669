//! # Ports Layer - Hexagonal Architecture
//!
//! - `inbound`: `AccountRestrictionApi`, driven by the transaction pipeline
//! - `outbound`: `RestrictionDocumentStore`, the external mirror

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
