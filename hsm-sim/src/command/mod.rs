//! Host command framing
//!
//! Simple structs and functions for the positional host command protocol
//! spoken by payment HSMs. A frame is a 4-byte ASCII header, a 2-byte ASCII
//! command code and a payload whose layout depends on the command.
//!
//! # Example
//! ```ignore
//! use hsm_sim::command::{parse_command, Response};
//!
//! // Parse an incoming frame
//! let cmd = parse_command(b"0001JA0010").unwrap();
//! assert_eq!(cmd.opcode_str(), "JA");
//!
//! // Build a success response, status code is derived from the opcode
//! let response = Response::success(&cmd, vec![0xAB; 16]);
//! assert_eq!(&response.status, b"JB");
//! ```

mod response;
mod status;

pub use response::Response;
pub use status::ErrorCode;

use std::borrow::Cow;

use thiserror::Error;

/// Length of the message header echoed in every response
pub const HEADER_LEN: usize = 4;

/// Length of a command or response code
pub const CODE_LEN: usize = 2;

/// Errors that can occur while framing a command
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("command frame too short: expected at least 6 bytes, got {0}")]
    TooShort(usize),
}

/// A parsed host command
///
/// # Fields
/// - `header`: Message header, echoed back unchanged
/// - `opcode`: Two-character command code (e.g. `A0`, `CA`)
/// - `payload`: Command-specific fields, positional
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Message header
    pub header: [u8; HEADER_LEN],
    /// Command code
    pub opcode: [u8; CODE_LEN],
    /// Command data (may be empty)
    pub payload: Vec<u8>,
}

impl Command {
    /// Create a new command
    pub fn new(header: [u8; HEADER_LEN], opcode: [u8; CODE_LEN], payload: Vec<u8>) -> Self {
        Self {
            header,
            opcode,
            payload,
        }
    }

    /// Command code as text, for logs and audit records
    pub fn opcode_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.opcode)
    }

    /// Success response code for this command
    ///
    /// By convention the response code is the command code with its second
    /// character incremented (`A0` -> `A1`, `BU` -> `BV`, `EC` -> `ED`).
    pub fn response_code(&self) -> [u8; CODE_LEN] {
        [self.opcode[0], self.opcode[1].wrapping_add(1)]
    }

    /// Serialize back to a raw frame
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(HEADER_LEN + CODE_LEN + self.payload.len());
        frame.extend_from_slice(&self.header);
        frame.extend_from_slice(&self.opcode);
        frame.extend_from_slice(&self.payload);
        frame
    }
}

/// Parse raw bytes into a Command
///
/// Splits `[0..4)` as header, `[4..6)` as command code and the rest as
/// payload. Payload content is not validated here; that is the handler's job.
///
/// # Example
/// ```ignore
/// let cmd = parse_command(b"HDR1NC").unwrap();
/// assert_eq!(&cmd.opcode, b"NC");
/// assert!(cmd.payload.is_empty());
/// ```
pub fn parse_command(data: &[u8]) -> Result<Command, CommandError> {
    if data.len() < HEADER_LEN + CODE_LEN {
        return Err(CommandError::TooShort(data.len()));
    }

    let mut header = [0u8; HEADER_LEN];
    header.copy_from_slice(&data[..HEADER_LEN]);

    let mut opcode = [0u8; CODE_LEN];
    opcode.copy_from_slice(&data[HEADER_LEN..HEADER_LEN + CODE_LEN]);

    Ok(Command {
        header,
        opcode,
        payload: data[HEADER_LEN + CODE_LEN..].to_vec(),
    })
}

/// Host command codes
pub mod opcode {
    pub const GENERATE_KEY: [u8; 2] = *b"A0";
    pub const TRANSLATE_PIN_BLOCK: [u8; 2] = *b"BU";
    pub const VERIFY_PIN: [u8; 2] = *b"CA";
    pub const GENERATE_CVV: [u8; 2] = *b"CW";
    pub const VERIFY_CVV: [u8; 2] = *b"CY";
    pub const GENERATE_MAC: [u8; 2] = *b"EC";
    pub const VERIFY_MAC: [u8; 2] = *b"ED";
    pub const IMPORT_KEY: [u8; 2] = *b"FA";
    pub const GENERATE_RANDOM: [u8; 2] = *b"JA";
    pub const DIAGNOSTIC: [u8; 2] = *b"NC";
    pub const STATUS: [u8; 2] = *b"NO";
}
