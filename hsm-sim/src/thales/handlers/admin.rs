//! Administrative commands: random numbers, diagnostics and status

use chrono::{SecondsFormat, Utc};
use rand::RngCore;
use serde::Serialize;
use serde_json::json;

use crate::audit::AuditLevel;
use crate::command::{Command, Response};
use crate::thales::{HsmContext, HsmError, PayloadReader};

/// Largest random block `JA` returns
pub const MAX_RANDOM_LEN: usize = 256;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Diagnostic<'a> {
    lmk_id: &'a str,
    firmware_version: &'a str,
    serial_number: &'a str,
    tamper_status: &'static str,
    battery_status: &'static str,
    timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    mode: &'a str,
    error_count: u64,
    keys_loaded: usize,
    /// Seconds since process start
    uptime: f64,
}

/// JA - Generate random bytes
///
/// Payload: length (4 hex). At most [`MAX_RANDOM_LEN`] bytes are returned.
pub fn generate_random(ctx: &HsmContext, cmd: &Command) -> Result<Response, HsmError> {
    let mut reader = PayloadReader::new(&cmd.payload);
    let requested = reader.hex_len("length")?;
    let mut data = vec![0u8; requested.min(MAX_RANDOM_LEN)];
    rand::thread_rng().fill_bytes(&mut data);

    ctx.audit()
        .log("THALES_JA", json!({ "length": requested }), AuditLevel::Debug);

    Ok(Response::success(cmd, data))
}

/// NC - Diagnostics
pub fn diagnostic(ctx: &HsmContext, cmd: &Command) -> Result<Response, HsmError> {
    let identity = ctx.identity();
    let info = Diagnostic {
        lmk_id: &identity.lmk_id,
        firmware_version: &identity.firmware_version,
        serial_number: &identity.serial_number,
        tamper_status: "00",
        battery_status: "00",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    let data = serde_json::to_vec(&info)?;

    ctx.audit().log("THALES_NC", json!(info), AuditLevel::Debug);

    Ok(Response::success(cmd, data))
}

/// NO - HSM status
pub fn status(ctx: &HsmContext, cmd: &Command) -> Result<Response, HsmError> {
    let info = Status {
        mode: &ctx.identity().mode,
        error_count: ctx.error_count(),
        keys_loaded: ctx.key_store().key_count(),
        uptime: ctx.uptime().as_secs_f64(),
    };
    let data = serde_json::to_vec(&info)?;

    ctx.audit().log("THALES_NO", json!(info), AuditLevel::Debug);

    Ok(Response::success(cmd, data))
}
