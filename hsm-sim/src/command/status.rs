//! Error code constants for host command responses
//!
//! Two-character codes returned after the `ER` response tag.

/// Error code constants
pub struct ErrorCode;

impl ErrorCode {
    pub const NO_ERROR: [u8; 2] = *b"00";
    pub const VERIFICATION_FAILURE: [u8; 2] = *b"01";
    pub const KEY_INAPPROPRIATE_LENGTH: [u8; 2] = *b"02";
    pub const KEY_PARITY_ERROR: [u8; 2] = *b"03";
    pub const INVALID_KEY_TYPE: [u8; 2] = *b"04";
    pub const DUPLICATE_KEY: [u8; 2] = *b"05";

    pub const SOURCE_KEY_PARITY_ERROR: [u8; 2] = *b"10";
    pub const DESTINATION_KEY_PARITY_ERROR: [u8; 2] = *b"11";
    pub const INVALID_MESSAGE_HEADER: [u8; 2] = *b"12";
    pub const INVALID_NUMBER_OF_COMPONENTS: [u8; 2] = *b"13";
    pub const NOT_A_KEY_ENCRYPTING_KEY: [u8; 2] = *b"14";
    pub const NO_VALID_PIN: [u8; 2] = *b"15";

    pub const INVALID_PIN_BLOCK_FORMAT: [u8; 2] = *b"20";
    pub const INVALID_ACCOUNT_NUMBER: [u8; 2] = *b"21";
    pub const NOT_AUTHORIZED: [u8; 2] = *b"22";
    pub const INVALID_COMMAND_FORMAT: [u8; 2] = *b"23";
    pub const INVALID_KEY_SCHEME: [u8; 2] = *b"24";
    pub const INCOMPATIBLE_KEY_LENGTH: [u8; 2] = *b"25";

    pub const COMMAND_DISABLED: [u8; 2] = *b"68";

    pub const INTERNAL_ERROR: [u8; 2] = *b"90";
    pub const MEMORY_ERROR: [u8; 2] = *b"91";
    pub const BATTERY_LOW: [u8; 2] = *b"92";
    pub const SYSTEM_MALFUNCTION: [u8; 2] = *b"96";

    const TABLE: &[([u8; 2], &str)] = &[
        (Self::NO_ERROR, "No error"),
        (Self::VERIFICATION_FAILURE, "Verification failure"),
        (Self::KEY_INAPPROPRIATE_LENGTH, "Key inappropriate length"),
        (Self::KEY_PARITY_ERROR, "Key parity error"),
        (Self::INVALID_KEY_TYPE, "Invalid key type"),
        (Self::DUPLICATE_KEY, "Duplicate key"),
        (Self::SOURCE_KEY_PARITY_ERROR, "Source key parity error"),
        (Self::DESTINATION_KEY_PARITY_ERROR, "Destination key parity error"),
        (Self::INVALID_MESSAGE_HEADER, "Invalid message header"),
        (Self::INVALID_NUMBER_OF_COMPONENTS, "Invalid number of components"),
        (Self::NOT_A_KEY_ENCRYPTING_KEY, "Not a key encrypting key"),
        (Self::NO_VALID_PIN, "PIN block does not contain valid PIN"),
        (Self::INVALID_PIN_BLOCK_FORMAT, "Invalid PIN block format"),
        (Self::INVALID_ACCOUNT_NUMBER, "Invalid account number"),
        (Self::NOT_AUTHORIZED, "Security module not in authorized state"),
        (Self::INVALID_COMMAND_FORMAT, "Invalid command format"),
        (Self::INVALID_KEY_SCHEME, "Invalid key scheme"),
        (Self::INCOMPATIBLE_KEY_LENGTH, "Incompatible key length"),
        (Self::COMMAND_DISABLED, "Command disabled"),
        (Self::INTERNAL_ERROR, "Internal HSM error"),
        (Self::MEMORY_ERROR, "HSM memory error"),
        (Self::BATTERY_LOW, "HSM battery low"),
        (Self::SYSTEM_MALFUNCTION, "System malfunction"),
    ];

    /// Look up the human-readable message for an error code
    pub fn message(code: [u8; 2]) -> Option<&'static str> {
        Self::TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, message)| *message)
    }

    /// All known codes, in table order
    pub fn all() -> impl Iterator<Item = [u8; 2]> {
        Self::TABLE.iter().map(|(code, _)| *code)
    }
}
