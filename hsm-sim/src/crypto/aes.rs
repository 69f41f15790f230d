//! AES Operations
//!
//! AES-ECB with PKCS#7 padding, used to wrap working keys under the LMK.

use aes::cipher::{
    block_padding::Pkcs7, generic_array::GenericArray, BlockDecryptMut, BlockEncrypt,
    BlockEncryptMut, KeyInit,
};
use aes::{Aes128, Aes192, Aes256};

use super::CryptoError;

enum AesCipher {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl AesCipher {
    fn new(key: &[u8]) -> Result<Self, CryptoError> {
        match key.len() {
            16 => Ok(Self::Aes128(Aes128::new(GenericArray::from_slice(key)))),
            24 => Ok(Self::Aes192(Aes192::new(GenericArray::from_slice(key)))),
            32 => Ok(Self::Aes256(Aes256::new(GenericArray::from_slice(key)))),
            n => Err(CryptoError::InvalidKeyLength(n)),
        }
    }

    fn encrypt(&self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.encrypt_block(block),
            Self::Aes192(c) => c.encrypt_block(block),
            Self::Aes256(c) => c.encrypt_block(block),
        }
    }
}

/// AES Operations
pub struct AesOperations;

impl AesOperations {
    /// AES block size
    pub const BLOCK_SIZE: usize = 16;

    /// Check whether a key length is a valid AES key length
    pub fn is_valid_key_length(len: usize) -> bool {
        matches!(len, 16 | 24 | 32)
    }

    /// Encrypt a single 16-byte block
    pub fn encrypt_block(key: &[u8], plaintext: &[u8]) -> Result<[u8; 16], CryptoError> {
        let mut block: [u8; 16] = plaintext.try_into().map_err(|_| CryptoError::InvalidBlockLength {
            expected: Self::BLOCK_SIZE,
            actual: plaintext.len(),
        })?;
        AesCipher::new(key)?.encrypt(&mut block);
        Ok(block)
    }

    /// Encrypt arbitrary-length data in ECB mode with PKCS#7 padding
    ///
    /// Output is always a whole number of blocks and at least one block longer
    /// than a block-aligned input.
    pub fn encrypt_ecb_padded(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let bad_key = |_| CryptoError::InvalidKeyLength(key.len());
        let ciphertext = match key.len() {
            16 => ecb::Encryptor::<Aes128>::new_from_slice(key)
                .map_err(bad_key)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            24 => ecb::Encryptor::<Aes192>::new_from_slice(key)
                .map_err(bad_key)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            32 => ecb::Encryptor::<Aes256>::new_from_slice(key)
                .map_err(bad_key)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            n => return Err(CryptoError::InvalidKeyLength(n)),
        };
        Ok(ciphertext)
    }

    /// Decrypt ECB data and strip PKCS#7 padding
    pub fn decrypt_ecb_padded(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.is_empty() || ciphertext.len() % Self::BLOCK_SIZE != 0 {
            return Err(CryptoError::UnalignedData {
                block_size: Self::BLOCK_SIZE,
                actual: ciphertext.len(),
            });
        }

        let bad_key = |_| CryptoError::InvalidKeyLength(key.len());
        let plaintext = match key.len() {
            16 => ecb::Decryptor::<Aes128>::new_from_slice(key)
                .map_err(bad_key)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            24 => ecb::Decryptor::<Aes192>::new_from_slice(key)
                .map_err(bad_key)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            32 => ecb::Decryptor::<Aes256>::new_from_slice(key)
                .map_err(bad_key)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            n => return Err(CryptoError::InvalidKeyLength(n)),
        };
        plaintext.map_err(|_| CryptoError::InvalidPadding)
    }
}
