//! Retail MAC (ISO 9797-1 Algorithm 3)
//!
//! CBC-MAC with single DES under the left key half, followed by a final
//! decrypt under the right half and encrypt under the left half. Messages are
//! padded with ISO 9797-1 method 2 (a `0x80` byte then zeros).

use block_padding::{Iso7816, RawPadding};
use cbc_mac::{CbcMac, Mac};
use des::Des;
use subtle::ConstantTimeEq;

use super::tdes::TDesOperations;
use super::CryptoError;

const BLOCK_SIZE: usize = 8;

/// Pad a message with ISO 9797-1 padding method 2
pub fn pad_method2(message: &[u8]) -> Vec<u8> {
    let padded_len = (message.len() / BLOCK_SIZE + 1) * BLOCK_SIZE;
    let tail = padded_len - BLOCK_SIZE;
    let mut padded = vec![0u8; padded_len];
    padded[..message.len()].copy_from_slice(message);
    Iso7816::raw_pad(&mut padded[tail..], message.len() - tail);
    padded
}

/// Compute a retail MAC over `message`
///
/// `key` is a double-length key (K_A || K_B) or a single-length key K,
/// which is used as K || K, so the result equals a plain DES CBC-MAC.
pub fn retail_mac(key: &[u8], message: &[u8]) -> Result<[u8; 8], CryptoError> {
    let (key_a, key_b) = match key.len() {
        8 => (key, key),
        16 => key.split_at(8),
        n => return Err(CryptoError::InvalidKeyLength(n)),
    };

    let mut cbc = CbcMac::<Des>::new_from_slice(key_a)
        .map_err(|_| CryptoError::InvalidKeyLength(key_a.len()))?;
    cbc.update(&pad_method2(message));
    let chained = cbc.finalize().into_bytes();

    let state = TDesOperations::decrypt_block(key_b, &chained)?;
    TDesOperations::encrypt_block(key_a, &state)
}

/// Verify a retail MAC, comparing in constant time
pub fn verify_retail_mac(key: &[u8], message: &[u8], mac: &[u8]) -> Result<bool, CryptoError> {
    let expected = retail_mac(key, message)?;
    Ok(expected[..].ct_eq(mac).into())
}
