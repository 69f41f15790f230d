//! MAC commands
//!
//! ISO 9797-1 algorithm 3 retail MAC under a single (`Z`) or double (`U`)
//! length MAK. The message length is 4 hex characters.

use serde_json::json;

use crate::audit::AuditLevel;
use crate::command::{Command, ErrorCode, Response};
use crate::crypto::{retail_mac, verify_retail_mac};
use crate::thales::{HsmContext, HsmError, PayloadReader};

const MAC_LEN: usize = 8;

/// EC - Generate a MAC
///
/// Payload: MAK (scheme + key), message length (4 hex), message.
pub fn generate_mac(ctx: &HsmContext, cmd: &Command) -> Result<Response, HsmError> {
    let mut reader = PayloadReader::new(&cmd.payload);
    let (mak, message) = read_mak_and_message(&mut reader)?;

    let mac = retail_mac(mak, message)?;

    ctx.audit().log(
        "THALES_EC",
        json!({ "messageLength": message.len() }),
        AuditLevel::Debug,
    );

    Ok(Response::success(cmd, mac.to_vec()))
}

/// ED - Verify a MAC
///
/// Payload: MAK (scheme + key), message length (4 hex), message, MAC (8).
pub fn verify_mac(ctx: &HsmContext, cmd: &Command) -> Result<Response, HsmError> {
    let mut reader = PayloadReader::new(&cmd.payload);
    let (mak, message) = read_mak_and_message(&mut reader)?;
    let received = reader.take(MAC_LEN, "MAC")?;

    let verified = verify_retail_mac(mak, message, received)?;

    ctx.audit().log(
        "THALES_ED",
        json!({ "messageLength": message.len(), "verified": verified }),
        if verified { AuditLevel::Debug } else { AuditLevel::Security },
    );

    if verified {
        Ok(Response::ok(cmd))
    } else {
        Ok(Response::error(cmd, ErrorCode::VERIFICATION_FAILURE))
    }
}

fn read_mak_and_message<'a>(
    reader: &mut PayloadReader<'a>,
) -> Result<(&'a [u8], &'a [u8]), HsmError> {
    let mak = reader.key("MAK")?;
    let len = reader.hex_len("message length")?;
    let message = reader.take(len, "message")?;
    Ok((mak, message))
}
