//! Key hierarchy
//!
//! The LMK that wraps every working key, the key-scheme tags that tell a
//! handler how wide a key field is, and the store that holds imported keys.

pub mod lmk;
pub mod store;

pub use lmk::Lmk;
pub use store::{InMemoryKeyStore, KeyInfo, KeyStore, StoreError};

/// Key length scheme carried in a 1-byte tag before a key field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyScheme {
    /// Single length, 8 bytes (`Z`)
    Single,
    /// Double length, 16 bytes (`U`)
    Double,
    /// Triple length, 24 bytes (`T`)
    Triple,
    /// 256-bit, 32 bytes (`X`)
    Extended,
}

impl KeyScheme {
    /// Parse a scheme tag
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'Z' => Some(Self::Single),
            b'U' => Some(Self::Double),
            b'T' => Some(Self::Triple),
            b'X' => Some(Self::Extended),
            _ => None,
        }
    }

    /// Scheme matching a key length
    pub fn from_key_len(len: usize) -> Option<Self> {
        match len {
            8 => Some(Self::Single),
            16 => Some(Self::Double),
            24 => Some(Self::Triple),
            32 => Some(Self::Extended),
            _ => None,
        }
    }

    /// The tag byte for this scheme
    pub fn tag(self) -> u8 {
        match self {
            Self::Single => b'Z',
            Self::Double => b'U',
            Self::Triple => b'T',
            Self::Extended => b'X',
        }
    }

    /// Key length in bytes
    pub fn key_len(self) -> usize {
        match self {
            Self::Single => 8,
            Self::Double => 16,
            Self::Triple => 24,
            Self::Extended => 32,
        }
    }

    /// Key length in bits
    pub fn key_bits(self) -> usize {
        self.key_len() * 8
    }

    /// Algorithm a key of this scheme is suited to
    pub fn algorithm(self) -> &'static str {
        match self {
            Self::Single => "DES",
            Self::Double => "AES-128 or 3DES-112",
            Self::Triple => "3DES-168",
            Self::Extended => "AES-256",
        }
    }
}

/// Describe the algorithm a key of this length is suited to
pub fn algorithm_for_length(len: usize) -> &'static str {
    KeyScheme::from_key_len(len).map_or("UNKNOWN", KeyScheme::algorithm)
}
