//! Positional payload reader
//!
//! Host command payloads are fixed-width fields at fixed offsets, except
//! that a key field is preceded by a 1-byte scheme tag giving its width.
//! Every read is bounds-checked and names the field it was reading, so a
//! short payload becomes an [`HsmError::Truncated`] instead of a panic.

use crate::keys::KeyScheme;

use super::HsmError;

pub struct PayloadReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset into the payload
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Read `len` raw bytes
    pub fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], HsmError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(HsmError::Truncated {
                field,
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Read a single byte
    pub fn byte(&mut self, field: &'static str) -> Result<u8, HsmError> {
        Ok(self.take(1, field)?[0])
    }

    /// Read `len` ASCII characters
    pub fn ascii(&mut self, len: usize, field: &'static str) -> Result<&'a str, HsmError> {
        let bytes = self.take(len, field)?;
        if !bytes.is_ascii() {
            return Err(HsmError::NotAscii { field });
        }
        std::str::from_utf8(bytes).map_err(|_| HsmError::NotAscii { field })
    }

    /// Read `len` decimal digits as a number
    pub fn decimal(&mut self, len: usize, field: &'static str) -> Result<usize, HsmError> {
        let text = self.ascii(len, field)?;
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HsmError::InvalidNumber { field });
        }
        text.parse().map_err(|_| HsmError::InvalidNumber { field })
    }

    /// Read a 4-character hex length
    pub fn hex_len(&mut self, field: &'static str) -> Result<usize, HsmError> {
        let text = self.ascii(4, field)?;
        usize::from_str_radix(text, 16).map_err(|_| HsmError::InvalidNumber { field })
    }

    /// Read `chars` hex characters and decode them
    pub fn hex_bytes(&mut self, chars: usize, field: &'static str) -> Result<Vec<u8>, HsmError> {
        let text = self.ascii(chars, field)?;
        hex::decode(text).map_err(|_| HsmError::InvalidHex { field })
    }

    /// Read a key scheme tag
    pub fn key_scheme(&mut self, field: &'static str) -> Result<KeyScheme, HsmError> {
        let tag = self.byte(field)?;
        KeyScheme::from_tag(tag).ok_or(HsmError::UnknownKeyScheme(char::from(tag)))
    }

    /// Read a scheme tag followed by a key of that width
    pub fn key_with_scheme(
        &mut self,
        field: &'static str,
    ) -> Result<(KeyScheme, &'a [u8]), HsmError> {
        let scheme = self.key_scheme(field)?;
        let key = self.take(scheme.key_len(), field)?;
        Ok((scheme, key))
    }

    /// Read a scheme-tagged key
    pub fn key(&mut self, field: &'static str) -> Result<&'a [u8], HsmError> {
        self.key_with_scheme(field).map(|(_, key)| key)
    }

    /// Everything not yet consumed
    pub fn rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }
}
