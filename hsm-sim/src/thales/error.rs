//! Handler errors
//!
//! Every failure inside a handler is an [`HsmError`]. The dispatcher turns
//! it into an `ER`/`90` response carrying the error's message; nothing else
//! inspects the variant on the wire.

use thiserror::Error;

use crate::card::CardError;
use crate::crypto::CryptoError;
use crate::keys::StoreError;
use crate::pin::PinError;

#[derive(Debug, Error)]
pub enum HsmError {
    #[error("payload truncated reading {field} at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("{field} is not ASCII")]
    NotAscii { field: &'static str },

    #[error("{field} is not valid hex")]
    InvalidHex { field: &'static str },

    #[error("{field} is not a valid number")]
    InvalidNumber { field: &'static str },

    #[error("unknown key scheme: {0:?}")]
    UnknownKeyScheme(char),

    #[error("PIN block format conversion not implemented ({from} -> {to})")]
    PinFormatConversion { from: String, to: String },

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Pin(#[from] PinError),

    #[error(transparent)]
    Card(#[from] CardError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("handler panicked: {0}")]
    Panic(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = HsmError::PinFormatConversion {
            from: "01".into(),
            to: "47".into(),
        };
        assert_eq!(
            err.to_string(),
            "PIN block format conversion not implemented (01 -> 47)"
        );

        assert_eq!(HsmError::UnknownKeyScheme('Q').to_string(), "unknown key scheme: 'Q'");

        let err: HsmError = CryptoError::InvalidKeyLength(5).into();
        assert_eq!(err.to_string(), "invalid key length: 5 bytes");
    }
}
