//! Error types for xyfast.
//!
//! Absence (a missing key, an empty structure) is never an error here; every
//! query encodes it as `Ok(None)`. Only contract violations surface as `Err`.

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The key has bits set above the configured key width.
    #[error("key {key:#x} does not fit in {bits} bits")]
    KeyOutOfRange { key: u64, bits: u32 },

    /// A structure was configured with an unusable key width.
    #[error("key width must be between 1 and 64 bits, got {bits}")]
    InvalidKeyBits { bits: u32 },
}
