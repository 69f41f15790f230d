//! CVV / CVV2 calculation
//!
//! PAN, expiry date and service code are concatenated, right-padded with `0`
//! to 32 digits and split into two 8-byte blocks. Block 1 is encrypted under
//! CVK-A, XORed with block 2, then run through E(CVK-A) D(CVK-B) E(CVK-A).
//! The CVV is decimalized from the hex digits of the result: decimal digits
//! first, then `A`-`F` mapped to `0`-`5`.

use crate::crypto::{xor_blocks, TDesOperations};

use super::CardError;

/// Number of digits in a CVV
pub const CVV_LEN: usize = 3;

const DATA_DIGITS: usize = 32;
const SINGLE_KEY_LEN: usize = 8;

/// Calculate a CVV
///
/// Only the leading 8 bytes of each CVK are used.
pub fn calculate_cvv(
    cvk_a: &[u8],
    cvk_b: &[u8],
    pan: &str,
    expiry: &str,
    service_code: &str,
) -> Result<String, CardError> {
    let key_a = single_key(cvk_a)?;
    let key_b = single_key(cvk_b)?;

    for (field, value) in [("PAN", pan), ("expiry", expiry), ("service code", service_code)] {
        if !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CardError::InvalidCardData(field));
        }
    }

    let data = format!("{}{}{}", pan, expiry, service_code);
    if data.len() > DATA_DIGITS {
        return Err(CardError::CardDataTooLong(data.len()));
    }
    let padded = format!("{:0<32}", data);

    let mut block1 = [0u8; 8];
    let mut block2 = [0u8; 8];
    hex::decode_to_slice(&padded[..16], &mut block1)
        .map_err(|_| CardError::InvalidCardData("PAN"))?;
    hex::decode_to_slice(&padded[16..], &mut block2)
        .map_err(|_| CardError::InvalidCardData("PAN"))?;

    let chained = xor_blocks(&TDesOperations::encrypt_block(key_a, &block1)?, &block2);
    let mut result = TDesOperations::encrypt_block(key_a, &chained)?;
    result = TDesOperations::decrypt_block(key_b, &result)?;
    result = TDesOperations::encrypt_block(key_a, &result)?;

    Ok(decimalize(&hex::encode_upper(result)))
}

fn single_key(key: &[u8]) -> Result<&[u8], CardError> {
    key.get(..SINGLE_KEY_LEN)
        .ok_or(CardError::ShortKey(key.len()))
}

fn decimalize(digits: &str) -> String {
    let mut cvv: String = digits
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(CVV_LEN)
        .collect();

    if cvv.len() < CVV_LEN {
        let letters = digits
            .bytes()
            .filter(|b| (b'A'..=b'F').contains(b))
            .map(|b| char::from(b - b'A' + b'0'));
        cvv.extend(letters.take(CVV_LEN - cvv.len()));
    }

    while cvv.len() < CVV_LEN {
        cvv.push('0');
    }
    cvv
}

#[cfg(test)]
mod tests {
    use super::*;

    const CVK_A: &str = "0123456789ABCDEF";
    const CVK_B: &str = "FEDCBA9876543210";

    #[test]
    fn test_published_vector() {
        let a = hex::decode(CVK_A).unwrap();
        let b = hex::decode(CVK_B).unwrap();
        assert_eq!(calculate_cvv(&a, &b, "4123456789012345", "8701", "101").unwrap(), "561");
    }

    #[test]
    fn test_double_length_keys_use_left_half() {
        let a = hex::decode(format!("{}{}", CVK_A, CVK_B)).unwrap();
        let b = hex::decode(format!("{}{}", CVK_B, CVK_A)).unwrap();
        assert_eq!(calculate_cvv(&a, &b, "4123456789012345", "8701", "101").unwrap(), "561");
    }

    #[test]
    fn test_deterministic() {
        let a = hex::decode(CVK_A).unwrap();
        let b = hex::decode(CVK_B).unwrap();
        let first = calculate_cvv(&a, &b, "4111111111111111", "2512", "201").unwrap();
        let second = calculate_cvv(&a, &b, "4111111111111111", "2512", "201").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "139");
    }

    #[test]
    fn test_decimalize() {
        assert_eq!(decimalize("5B614982E03C97DD"), "561");
        assert_eq!(decimalize("ABCDEF1FFFFFFFFF"), "101");
        assert_eq!(decimalize("ABFFFFFFFFFFFFFF"), "015");
        assert_eq!(decimalize(""), "000");
    }

    #[test]
    fn test_invalid_input() {
        let a = hex::decode(CVK_A).unwrap();
        let b = hex::decode(CVK_B).unwrap();
        assert_eq!(
            calculate_cvv(&a, &b, "41111111111X1111", "2512", "201"),
            Err(CardError::InvalidCardData("PAN"))
        );
        assert_eq!(
            calculate_cvv(&a[..4], &b, "4111111111111111", "2512", "201"),
            Err(CardError::ShortKey(4))
        );
    }
}
