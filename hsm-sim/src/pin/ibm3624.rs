//! IBM 3624 PIN verification
//!
//! The natural PIN is derived by encrypting the validation data under the
//! PVK and mapping the leading hex digits of the result through a
//! decimalization table. The customer PIN is the natural PIN plus a per-card
//! offset, digit by digit, modulo 10.

use crate::crypto::TDesOperations;

use super::{PinError, MAX_PIN_LEN, MIN_PIN_LEN};

/// Length of a decimalization table
pub const DECIMALIZATION_TABLE_LEN: usize = 16;

/// Derive the natural PIN
///
/// `validation_data` is hex, right-padded with `0` to one 8-byte block.
pub fn natural_pin(
    pvk: &[u8],
    validation_data: &str,
    decimalization_table: &str,
    check_len: usize,
) -> Result<String, PinError> {
    if !(MIN_PIN_LEN..=MAX_PIN_LEN).contains(&check_len) {
        return Err(PinError::InvalidCheckLength(check_len));
    }
    let table = parse_table(decimalization_table)?;
    let block = validation_block(validation_data)?;
    let encrypted = TDesOperations::encrypt_block(pvk, &block)?;

    Ok(encrypted
        .iter()
        .flat_map(|b| [b >> 4, b & 0x0F])
        .take(check_len)
        .map(|n| char::from(b'0' + table[n as usize]))
        .collect())
}

/// Add a PIN offset to a natural PIN, digit by digit modulo 10
///
/// Only the leading `natural.len()` offset digits are used; the rest of the
/// offset field is filler.
pub fn apply_offset(natural: &str, offset: &str) -> Result<String, PinError> {
    if offset.len() < natural.len() {
        return Err(PinError::InvalidOffset);
    }

    natural
        .bytes()
        .zip(offset.bytes())
        .map(|(n, o)| {
            if !n.is_ascii_digit() || !o.is_ascii_digit() {
                return Err(PinError::InvalidOffset);
            }
            Ok(char::from(b'0' + (n - b'0' + o - b'0') % 10))
        })
        .collect()
}

/// Compare a candidate PIN against natural PIN plus offset over `check_len`
/// digits
///
/// A candidate shorter than `check_len` never matches.
pub fn verify_with_offset(
    candidate: &str,
    natural: &str,
    offset: &str,
    check_len: usize,
) -> Result<bool, PinError> {
    if natural.len() != check_len {
        return Err(PinError::InvalidCheckLength(check_len));
    }
    let expected = apply_offset(natural, offset)?;
    Ok(candidate.len() >= check_len && candidate.as_bytes()[..check_len] == *expected.as_bytes())
}

fn parse_table(table: &str) -> Result<[u8; DECIMALIZATION_TABLE_LEN], PinError> {
    if table.len() != DECIMALIZATION_TABLE_LEN {
        return Err(PinError::InvalidDecimalizationTable);
    }
    let mut out = [0u8; DECIMALIZATION_TABLE_LEN];
    for (o, d) in out.iter_mut().zip(table.bytes()) {
        if !d.is_ascii_digit() {
            return Err(PinError::InvalidDecimalizationTable);
        }
        *o = d - b'0';
    }
    Ok(out)
}

fn validation_block(data: &str) -> Result<[u8; 8], PinError> {
    if data.len() > 16 {
        return Err(PinError::InvalidValidationData);
    }
    let padded = format!("{:0<16}", data);
    let mut block = [0u8; 8];
    hex::decode_to_slice(padded, &mut block).map_err(|_| PinError::InvalidValidationData)?;
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PVK: &str = "0123456789ABCDEFFEDCBA9876543210";
    const TABLE: &str = "0123456789012345";

    #[test]
    fn test_natural_pin_known_vector() {
        // 3DES(PVK, 4111111111110000) = BAC04DCA36E7BD1A
        // B A C 0 through the table -> 1 0 2 0
        let pvk = hex::decode(PVK).unwrap();
        assert_eq!(natural_pin(&pvk, "411111111111", TABLE, 4).unwrap(), "1020");
        assert_eq!(natural_pin(&pvk, "411111111111", TABLE, 6).unwrap(), "102043");
    }

    #[test]
    fn test_apply_offset() {
        assert_eq!(apply_offset("1020", "0000FFFFFFFF").unwrap(), "1020");
        assert_eq!(apply_offset("1020", "9999").unwrap(), "0919");
        assert_eq!(apply_offset("5678", "1234").unwrap(), "6802");
        assert_eq!(apply_offset("1020", "12"), Err(PinError::InvalidOffset));
        assert_eq!(apply_offset("1020", "12A4"), Err(PinError::InvalidOffset));
    }

    #[test]
    fn test_verify_with_offset() {
        assert!(verify_with_offset("1020", "1020", "000000000000", 4).unwrap());
        assert!(verify_with_offset("102099", "1020", "000000000000", 4).unwrap());
        assert!(!verify_with_offset("1021", "1020", "000000000000", 4).unwrap());
        assert!(!verify_with_offset("10", "1020", "000000000000", 4).unwrap());
    }

    #[test]
    fn test_invalid_inputs() {
        let pvk = hex::decode(PVK).unwrap();
        assert_eq!(
            natural_pin(&pvk, "411111111111", "0123456789ABCDEF", 4),
            Err(PinError::InvalidDecimalizationTable)
        );
        assert_eq!(
            natural_pin(&pvk, "41111111111Z", TABLE, 4),
            Err(PinError::InvalidValidationData)
        );
        assert_eq!(
            natural_pin(&pvk, "411111111111", TABLE, 3),
            Err(PinError::InvalidCheckLength(3))
        );
    }
}
