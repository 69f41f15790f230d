//! Card verification commands

use serde_json::json;
use subtle::ConstantTimeEq;

use crate::audit::AuditLevel;
use crate::card::{calculate_cvv, mask_pan, CVV_LEN};
use crate::command::{Command, ErrorCode, Response};
use crate::thales::{HsmContext, HsmError, PayloadReader};

struct CardData<'a> {
    pan: String,
    expiry: &'a str,
    service_code: &'a str,
}

/// CW - Generate a CVV
///
/// Payload: scheme (1), CVK-A, CVK-B, PAN (16, `F` padded), expiry YYMM (4),
/// service code (3).
pub fn generate_cvv(ctx: &HsmContext, cmd: &Command) -> Result<Response, HsmError> {
    let mut reader = PayloadReader::new(&cmd.payload);
    let (cvk_a, cvk_b) = read_cvk_pair(&mut reader)?;
    let card = read_card_data(&mut reader)?;

    let cvv = calculate_cvv(cvk_a, cvk_b, &card.pan, card.expiry, card.service_code)?;

    ctx.audit().log(
        "THALES_CW",
        json!({ "pan": mask_pan(&card.pan), "expiryDate": card.expiry }),
        AuditLevel::Info,
    );

    Ok(Response::success(cmd, cvv.into_bytes()))
}

/// CY - Verify a CVV
///
/// Payload: scheme (1), CVK-A, CVK-B, CVV (3), PAN (16), expiry (4), service
/// code (3).
pub fn verify_cvv(ctx: &HsmContext, cmd: &Command) -> Result<Response, HsmError> {
    let mut reader = PayloadReader::new(&cmd.payload);
    let (cvk_a, cvk_b) = read_cvk_pair(&mut reader)?;
    let supplied = reader.ascii(CVV_LEN, "CVV")?;
    let card = read_card_data(&mut reader)?;

    let expected = calculate_cvv(cvk_a, cvk_b, &card.pan, card.expiry, card.service_code)?;
    let verified: bool = expected.as_bytes().ct_eq(supplied.as_bytes()).into();

    ctx.audit().log(
        "THALES_CY",
        json!({ "pan": mask_pan(&card.pan), "verified": verified }),
        if verified { AuditLevel::Info } else { AuditLevel::Security },
    );

    if verified {
        Ok(Response::ok(cmd))
    } else {
        Ok(Response::error(cmd, ErrorCode::VERIFICATION_FAILURE))
    }
}

fn read_cvk_pair<'a>(reader: &mut PayloadReader<'a>) -> Result<(&'a [u8], &'a [u8]), HsmError> {
    let scheme = reader.key_scheme("CVK scheme")?;
    let cvk_a = reader.take(scheme.key_len(), "CVK-A")?;
    let cvk_b = reader.take(scheme.key_len(), "CVK-B")?;
    Ok((cvk_a, cvk_b))
}

fn read_card_data<'a>(reader: &mut PayloadReader<'a>) -> Result<CardData<'a>, HsmError> {
    let pan = reader.ascii(16, "PAN")?.replace('F', "");
    let expiry = reader.ascii(4, "expiry date")?;
    let service_code = reader.ascii(3, "service code")?;
    Ok(CardData {
        pan,
        expiry,
        service_code,
    })
}
