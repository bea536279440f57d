//! # Validation Errors
//!
//! Errors raised when constructing domain primitives from untrusted input
//! (configuration, HTTP paths, JSON-RPC responses). Each variant carries the
//! rejected input so operators can diagnose misconfiguration directly.

use thiserror::Error;

/// Validation errors for domain primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Network name is empty, too long, or contains disallowed characters.
    #[error("invalid network name \"{name}\": {reason}")]
    InvalidNetworkName {
        /// The rejected input.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A numeric quantity could not be parsed as a 256-bit unsigned integer.
    #[error("invalid quantity \"{0}\" (expected decimal or 0x-prefixed hex)")]
    InvalidQuantity(String),

    /// A quantity does not fit the requested width.
    #[error("quantity {0} does not fit in 64 bits")]
    QuantityOverflow(String),

    /// A digest is not a 0x-prefixed 32-byte hex string.
    #[error("invalid 32-byte digest \"{0}\"")]
    InvalidDigest(String),
}
