//! Local Master Key
//!
//! The single secret at the root of the key hierarchy. Working keys leave the
//! HSM only wrapped under it. The LMK is supplied at start-up and is
//! read-only afterwards.

use std::fmt;

use zeroize::Zeroizing;

use crate::crypto::{AesOperations, CryptoError};

/// Local Master Key
pub struct Lmk {
    key: Zeroizing<Vec<u8>>,
}

impl Lmk {
    /// Create an LMK from raw key bytes (16, 24 or 32 bytes)
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if !AesOperations::is_valid_key_length(key.len()) {
            return Err(CryptoError::InvalidKeyLength(key.len()));
        }
        Ok(Self {
            key: Zeroizing::new(key.to_vec()),
        })
    }

    /// Wrap a clear key under the LMK
    pub fn wrap(&self, clear_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        AesOperations::encrypt_ecb_padded(&self.key, clear_key)
    }

    /// Recover a clear key wrapped under the LMK
    pub fn unwrap_key(&self, wrapped_key: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        AesOperations::decrypt_ecb_padded(&self.key, wrapped_key).map(Zeroizing::new)
    }

    /// LMK length in bytes
    pub fn len(&self) -> usize {
        self.key.len()
    }

    /// Always false; an LMK cannot be empty
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Debug for Lmk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lmk")
            .field("len", &self.key.len())
            .finish_non_exhaustive()
    }
}
