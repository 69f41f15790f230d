//! ISO 9564-1 PIN blocks
//!
//! Clear PIN block layout: a control nibble naming the format, a PIN length
//! nibble, the PIN digits and fill nibbles up to 16. Formats 0 and 3 are then
//! XORed with the account block (`0000` followed by the 12 rightmost PAN
//! digits excluding the check digit).
//!
//! | Format | Host code | Control | Fill                 | Account XOR |
//! |--------|-----------|---------|----------------------|-------------|
//! | ISO 0  | `01`      | `0`     | `F`                  | yes         |
//! | ISO 1  | `05`      | `1`     | random `0`-`F`       | no          |
//! | ISO 3  | `47`      | `3`     | random `A`-`F`       | yes         |

use rand::Rng;

use super::{PinError, MAX_PIN_LEN, MIN_PIN_LEN};

/// Number of account digits in an account block
pub const ACCOUNT_DIGITS: usize = 12;

/// PIN block format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinBlockFormat {
    /// ISO 9564-1 format 0 (ANSI X9.8)
    Iso0,
    /// ISO 9564-1 format 1
    Iso1,
    /// ISO 9564-1 format 3
    Iso3,
}

impl PinBlockFormat {
    /// Parse a 2-character host format code
    pub fn from_code(code: &str) -> Result<Self, PinError> {
        match code {
            "01" => Ok(Self::Iso0),
            "05" => Ok(Self::Iso1),
            "47" => Ok(Self::Iso3),
            other => Err(PinError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Host format code
    pub fn code(self) -> &'static str {
        match self {
            Self::Iso0 => "01",
            Self::Iso1 => "05",
            Self::Iso3 => "47",
        }
    }

    /// Control nibble of the clear block
    pub fn control(self) -> u8 {
        match self {
            Self::Iso0 => 0x0,
            Self::Iso1 => 0x1,
            Self::Iso3 => 0x3,
        }
    }

    fn uses_account(self) -> bool {
        !matches!(self, Self::Iso1)
    }

    fn fill_nibble<R: Rng>(self, rng: &mut R) -> u8 {
        match self {
            Self::Iso0 => 0xF,
            Self::Iso1 => rng.gen_range(0x0..=0xF),
            Self::Iso3 => rng.gen_range(0xA..=0xF),
        }
    }
}

/// Account number for PIN blocks from a full PAN
///
/// The 12 rightmost digits excluding the check digit.
pub fn account_from_pan(pan: &str) -> Result<String, PinError> {
    if pan.len() < ACCOUNT_DIGITS + 1 || !pan.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PinError::InvalidAccount(pan.to_string()));
    }
    let end = pan.len() - 1;
    Ok(pan[end - ACCOUNT_DIGITS..end].to_string())
}

/// Build the account block for a 12-digit account number
pub fn account_block(account: &str) -> Result<[u8; 8], PinError> {
    if account.len() != ACCOUNT_DIGITS || !account.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PinError::InvalidAccount(account.to_string()));
    }

    let mut nibbles = [0u8; 16];
    for (n, d) in nibbles[4..].iter_mut().zip(account.bytes()) {
        *n = d - b'0';
    }
    Ok(pack(&nibbles))
}

/// Build a clear PIN block
pub fn build_pin_block(
    format: PinBlockFormat,
    pin: &str,
    account: &str,
) -> Result<[u8; 8], PinError> {
    if pin.len() < MIN_PIN_LEN || pin.len() > MAX_PIN_LEN {
        return Err(PinError::InvalidLength(pin.len()));
    }
    if !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PinError::NonDecimalPin);
    }

    let mut rng = rand::thread_rng();
    let mut nibbles = [0u8; 16];
    nibbles[0] = format.control();
    nibbles[1] = pin.len() as u8;
    for (i, n) in nibbles[2..].iter_mut().enumerate() {
        *n = match pin.as_bytes().get(i) {
            Some(d) => d - b'0',
            None => format.fill_nibble(&mut rng),
        };
    }

    let mut block = pack(&nibbles);
    if format.uses_account() {
        xor_in_place(&mut block, &account_block(account)?);
    }
    Ok(block)
}

/// Recover the PIN from a clear PIN block
pub fn extract_pin(
    format: PinBlockFormat,
    block: &[u8; 8],
    account: &str,
) -> Result<String, PinError> {
    let mut clear = *block;
    if format.uses_account() {
        xor_in_place(&mut clear, &account_block(account)?);
    }

    let nibbles = unpack(&clear);
    if nibbles[0] != format.control() {
        return Err(PinError::ControlMismatch {
            expected: format.control(),
            found: nibbles[0],
        });
    }

    let len = nibbles[1] as usize;
    if !(MIN_PIN_LEN..=MAX_PIN_LEN).contains(&len) {
        return Err(PinError::InvalidLength(len));
    }

    nibbles[2..2 + len]
        .iter()
        .map(|&n| {
            if n <= 9 {
                Ok(char::from(b'0' + n))
            } else {
                Err(PinError::InvalidPinDigit)
            }
        })
        .collect()
}

fn pack(nibbles: &[u8; 16]) -> [u8; 8] {
    let mut out = [0u8; 8];
    for (o, pair) in out.iter_mut().zip(nibbles.chunks_exact(2)) {
        *o = (pair[0] << 4) | pair[1];
    }
    out
}

fn unpack(block: &[u8; 8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for (pair, b) in out.chunks_exact_mut(2).zip(block) {
        pair[0] = b >> 4;
        pair[1] = b & 0x0F;
    }
    out
}

fn xor_in_place(block: &mut [u8; 8], other: &[u8; 8]) {
    for (b, o) in block.iter_mut().zip(other) {
        *b ^= o;
    }
}
