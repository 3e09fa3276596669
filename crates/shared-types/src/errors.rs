//! # Error Types
//!
//! Errors raised while decoding shared identifiers from text.

use thiserror::Error;

/// Errors that can occur when parsing an identifier from its hex form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input is not valid hex.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded byte length does not match the identifier width.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
