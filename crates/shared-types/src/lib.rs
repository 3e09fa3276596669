//! # Shared Types Crate
//!
//! Ledger primitives shared by every crate in the workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Account, mosaic and transaction-type
//!   identifiers are defined once here.
//! - **Fixed Widths**: Every identifier has a fixed serialized width so the
//!   restriction engine can size its value sets and documents up front.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
