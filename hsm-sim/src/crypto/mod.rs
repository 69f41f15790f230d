//! Cryptographic Operations
//!
//! Block-cipher primitives used by the host command handlers: DES/3DES and AES
//! in ECB mode, the ISO 9797-1 retail MAC and key check values.

pub mod aes;
pub mod mac;
pub mod tdes;

pub use self::aes::AesOperations;
pub use self::mac::{retail_mac, verify_retail_mac};
pub use self::tdes::TDesOperations;

use thiserror::Error;

/// Errors raised by the block-cipher primitives
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid key length: {0} bytes")]
    InvalidKeyLength(usize),

    #[error("invalid block length: expected {expected} bytes, got {actual}")]
    InvalidBlockLength { expected: usize, actual: usize },

    #[error("data length {actual} is not a non-zero multiple of block size {block_size}")]
    UnalignedData { block_size: usize, actual: usize },

    #[error("invalid padding")]
    InvalidPadding,
}

/// Length of a key check value in bytes
pub const KCV_LEN: usize = 3;

/// Compute the key check value of a key
///
/// The first three bytes of the key encrypting an all-zero block: DES/3DES
/// over 8 bytes for 8, 16 and 24-byte keys, AES-256 over 16 bytes for 32-byte
/// keys.
pub fn key_check_value(key: &[u8]) -> Result<[u8; KCV_LEN], CryptoError> {
    let mut kcv = [0u8; KCV_LEN];
    match key.len() {
        8 | 16 | 24 => {
            let block = TDesOperations::encrypt_block(key, &[0u8; TDesOperations::BLOCK_SIZE])?;
            kcv.copy_from_slice(&block[..KCV_LEN]);
        }
        32 => {
            let block = AesOperations::encrypt_block(key, &[0u8; AesOperations::BLOCK_SIZE])?;
            kcv.copy_from_slice(&block[..KCV_LEN]);
        }
        n => return Err(CryptoError::InvalidKeyLength(n)),
    }
    Ok(kcv)
}

/// XOR two 8-byte blocks
pub fn xor_blocks(a: &[u8; 8], b: &[u8; 8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b)) {
        *o = x ^ y;
    }
    out
}
