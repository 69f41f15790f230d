//! Host command response handling
//!
//! A Response echoes the command header, carries a 2-character response code
//! and, for failures, the `ER` tag followed by a 2-character error code.

use super::status::ErrorCode;
use super::{Command, CODE_LEN, HEADER_LEN};

/// Response code used for every error response
pub const ERROR_STATUS: [u8; CODE_LEN] = *b"ER";

/// An HSM response
///
/// Invariant: `error_code` is `Some` exactly when `status` is [`ERROR_STATUS`].
///
/// # Example
/// ```ignore
/// let ok = Response::success(&cmd, vec![0x01, 0x02]);
/// assert!(ok.is_okay());
///
/// let err = Response::error(&cmd, ErrorCode::COMMAND_DISABLED);
/// assert_eq!(err.to_bytes(), b"0001ER68Command disabled");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Header echoed from the command
    pub header: [u8; HEADER_LEN],
    /// Response code (`A1`, `CB`, ... or `ER`)
    pub status: [u8; CODE_LEN],
    /// Error code, present only on `ER` responses
    pub error_code: Option<[u8; CODE_LEN]>,
    /// Response data
    pub data: Vec<u8>,
}

impl Response {
    /// Create a success response for a command, using its conventional
    /// response code
    pub fn success(cmd: &Command, data: Vec<u8>) -> Self {
        Self {
            header: cmd.header,
            status: cmd.response_code(),
            error_code: None,
            data,
        }
    }

    /// Create an empty success response
    pub fn ok(cmd: &Command) -> Self {
        Self::success(cmd, Vec::new())
    }

    /// Create an error response whose data is the table message for `code`
    pub fn error(cmd: &Command, code: [u8; CODE_LEN]) -> Self {
        let message = ErrorCode::message(code).unwrap_or("Unknown error");
        Self::error_for_header(cmd.header, code, message)
    }

    /// Create an error response carrying a specific message
    pub fn error_with_message(cmd: &Command, code: [u8; CODE_LEN], message: &str) -> Self {
        Self::error_for_header(cmd.header, code, message)
    }

    /// Create an error response when only the header is known
    pub fn error_for_header(header: [u8; HEADER_LEN], code: [u8; CODE_LEN], message: &str) -> Self {
        Self {
            header,
            status: ERROR_STATUS,
            error_code: Some(code),
            data: message.as_bytes().to_vec(),
        }
    }

    /// Check if the response is a success
    pub fn is_okay(&self) -> bool {
        self.error_code.is_none()
    }

    /// Check if the response reports a failed verification (PIN, CVV, MAC)
    pub fn is_verification_failure(&self) -> bool {
        self.error_code == Some(ErrorCode::VERIFICATION_FAILURE)
    }

    /// Response code as text
    pub fn status_str(&self) -> String {
        String::from_utf8_lossy(&self.status).into_owned()
    }

    /// Error code as text, if any
    pub fn error_code_str(&self) -> Option<String> {
        self.error_code
            .map(|code| String::from_utf8_lossy(&code).into_owned())
    }

    /// Convert to raw bytes for transmission
    ///
    /// Header, response code, error code (if present) and data, concatenated
    /// in that order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result =
            Vec::with_capacity(HEADER_LEN + 2 * CODE_LEN + self.data.len());
        result.extend_from_slice(&self.header);
        result.extend_from_slice(&self.status);
        if let Some(code) = self.error_code {
            result.extend_from_slice(&code);
        }
        result.extend_from_slice(&self.data);
        result
    }

    /// Check if response has no data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(opcode: &[u8; 2]) -> Command {
        Command::new(*b"0001", *opcode, Vec::new())
    }

    #[test]
    fn test_success_response() {
        let resp = Response::success(&cmd(b"EC"), vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(resp.is_okay());
        assert_eq!(&resp.status, b"ED");
        assert_eq!(resp.to_bytes(), b"0001ED\xDE\xAD\xBE\xEF".to_vec());
    }

    #[test]
    fn test_ok_response() {
        let resp = Response::ok(&cmd(b"CA"));
        assert!(resp.is_okay());
        assert!(resp.is_empty());
        assert_eq!(resp.to_bytes(), b"0001CB".to_vec());
    }

    #[test]
    fn test_error_response_uses_table_message() {
        let resp = Response::error(&cmd(b"ZZ"), ErrorCode::COMMAND_DISABLED);
        assert!(!resp.is_okay());
        assert_eq!(&resp.status, b"ER");
        assert_eq!(resp.error_code_str().as_deref(), Some("68"));
        assert_eq!(resp.to_bytes(), b"0001ER68Command disabled".to_vec());
    }

    #[test]
    fn test_error_with_message() {
        let resp = Response::error_with_message(&cmd(b"A0"), ErrorCode::INTERNAL_ERROR, "boom");
        assert_eq!(resp.to_bytes(), b"0001ER90boom".to_vec());
    }

    #[test]
    fn test_verification_failure() {
        let resp = Response::error(&cmd(b"CY"), ErrorCode::VERIFICATION_FAILURE);
        assert!(resp.is_verification_failure());
        assert_eq!(resp.data, b"Verification failure".to_vec());
    }
}
