//! PIN processing
//!
//! ISO 9564-1 PIN blocks and the IBM 3624 PIN verification method.

pub mod block;
pub mod ibm3624;

pub use block::{account_block, account_from_pan, build_pin_block, extract_pin, PinBlockFormat};
pub use ibm3624::{apply_offset, natural_pin, verify_with_offset};

use thiserror::Error;

use crate::crypto::CryptoError;

/// Shortest PIN accepted in a PIN block
pub const MIN_PIN_LEN: usize = 4;

/// Longest PIN accepted in a PIN block
pub const MAX_PIN_LEN: usize = 12;

/// Errors raised while building or reading PIN blocks
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PinError {
    #[error("unsupported PIN block format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid PIN length: {0}")]
    InvalidLength(usize),

    #[error("PIN contains non-decimal digits")]
    NonDecimalPin,

    #[error("invalid account number: {0}")]
    InvalidAccount(String),

    #[error("PIN block control field {found:X} does not match format {expected:X}")]
    ControlMismatch { expected: u8, found: u8 },

    #[error("PIN block holds a non-decimal PIN digit")]
    InvalidPinDigit,

    #[error("invalid decimalization table")]
    InvalidDecimalizationTable,

    #[error("invalid PIN offset")]
    InvalidOffset,

    #[error("invalid check length: {0}")]
    InvalidCheckLength(usize),

    #[error("invalid PIN validation data")]
    InvalidValidationData,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
