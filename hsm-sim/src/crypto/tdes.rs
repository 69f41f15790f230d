//! DES and Triple DES Operations
//!
//! ECB primitives over 8-byte blocks. The key length selects the algorithm:
//! 8 bytes is single DES, 16 bytes two-key 3DES (EDE2), 24 bytes three-key
//! 3DES (EDE3).

use des::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use des::{Des, TdesEde2, TdesEde3};
use log::debug;

use super::CryptoError;

/// A DES-family cipher keyed by length
enum DesCipher {
    Single(Des),
    Double(TdesEde2),
    Triple(TdesEde3),
}

impl DesCipher {
    fn new(key: &[u8]) -> Result<Self, CryptoError> {
        match key.len() {
            8 => Ok(Self::Single(Des::new(GenericArray::from_slice(key)))),
            16 => Ok(Self::Double(TdesEde2::new(GenericArray::from_slice(key)))),
            24 => Ok(Self::Triple(TdesEde3::new(GenericArray::from_slice(key)))),
            n => Err(CryptoError::InvalidKeyLength(n)),
        }
    }

    fn encrypt(&self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            Self::Single(c) => c.encrypt_block(block),
            Self::Double(c) => c.encrypt_block(block),
            Self::Triple(c) => c.encrypt_block(block),
        }
    }

    fn decrypt(&self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            Self::Single(c) => c.decrypt_block(block),
            Self::Double(c) => c.decrypt_block(block),
            Self::Triple(c) => c.decrypt_block(block),
        }
    }
}

/// DES / Triple DES Operations
pub struct TDesOperations;

impl TDesOperations {
    /// Block size for DES and 3DES
    pub const BLOCK_SIZE: usize = 8;

    /// Encrypt a single block
    pub fn encrypt_block(key: &[u8], plaintext: &[u8]) -> Result<[u8; 8], CryptoError> {
        let mut block = Self::to_block(plaintext)?;
        DesCipher::new(key)?.encrypt(&mut block);
        Ok(block)
    }

    /// Decrypt a single block
    pub fn decrypt_block(key: &[u8], ciphertext: &[u8]) -> Result<[u8; 8], CryptoError> {
        let mut block = Self::to_block(ciphertext)?;
        DesCipher::new(key)?.decrypt(&mut block);
        Ok(block)
    }

    /// Encrypt multiple blocks in ECB mode
    pub fn encrypt_ecb(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Self::check_aligned(plaintext)?;
        let cipher = DesCipher::new(key)?;

        debug!("DES-ECB encrypting {} bytes with {}-byte key", plaintext.len(), key.len());

        let mut result = plaintext.to_vec();
        for chunk in result.chunks_mut(Self::BLOCK_SIZE) {
            cipher.encrypt(chunk);
        }
        Ok(result)
    }

    /// Decrypt multiple blocks in ECB mode
    pub fn decrypt_ecb(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Self::check_aligned(ciphertext)?;
        let cipher = DesCipher::new(key)?;

        debug!("DES-ECB decrypting {} bytes with {}-byte key", ciphertext.len(), key.len());

        let mut result = ciphertext.to_vec();
        for chunk in result.chunks_mut(Self::BLOCK_SIZE) {
            cipher.decrypt(chunk);
        }
        Ok(result)
    }

    fn to_block(data: &[u8]) -> Result<[u8; 8], CryptoError> {
        data.try_into().map_err(|_| CryptoError::InvalidBlockLength {
            expected: Self::BLOCK_SIZE,
            actual: data.len(),
        })
    }

    fn check_aligned(data: &[u8]) -> Result<(), CryptoError> {
        if data.is_empty() || data.len() % Self::BLOCK_SIZE != 0 {
            return Err(CryptoError::UnalignedData {
                block_size: Self::BLOCK_SIZE,
                actual: data.len(),
            });
        }
        Ok(())
    }
}

/// Force odd parity on every byte of a DES key
pub fn set_odd_parity(key: &mut [u8]) {
    for byte in key.iter_mut() {
        if byte.count_ones() % 2 == 0 {
            *byte ^= 0x01;
        }
    }
}

/// Check that every byte of a DES key has odd parity
pub fn has_odd_parity(key: &[u8]) -> bool {
    key.iter().all(|b| b.count_ones() % 2 == 1)
}
