//! Card verification values
//!
//! The classic CVV/CVV2 computation and helpers for handling card data in
//! logs.

pub mod cvv;

pub use cvv::{calculate_cvv, CVV_LEN};

use thiserror::Error;

use crate::crypto::CryptoError;

/// Errors raised while computing card verification values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("card data is not decimal: {0}")]
    InvalidCardData(&'static str),

    #[error("card data too long: {0} digits")]
    CardDataTooLong(usize),

    #[error("card verification key must be at least 8 bytes, got {0}")]
    ShortKey(usize),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Mask a PAN for logging, keeping the first 6 and last 4 digits
pub fn mask_pan(pan: &str) -> String {
    if pan.len() <= 10 || !pan.is_ascii() {
        return "*".repeat(pan.chars().count());
    }
    format!(
        "{}{}{}",
        &pan[..6],
        "*".repeat(pan.len() - 10),
        &pan[pan.len() - 4..]
    )
}
