//! PIN commands
//!
//! PIN blocks travel as 16 hex characters encoding the encrypted 8-byte
//! block. Format codes are `01` (ISO 0), `05` (ISO 1) and `47` (ISO 3).

use serde_json::json;
use zeroize::Zeroizing;

use crate::audit::AuditLevel;
use crate::command::{Command, ErrorCode, Response};
use crate::crypto::TDesOperations;
use crate::pin::{extract_pin, natural_pin, verify_with_offset, PinBlockFormat};
use crate::thales::{HsmContext, HsmError, PayloadReader};

const PIN_BLOCK_CHARS: usize = 16;
const PVK_LEN: usize = 16;

/// BU - Translate a PIN block from one key to another
///
/// Payload: source key (scheme + key), destination key (scheme + key), PIN
/// block (16 hex), source format (2), destination format (2), account (12).
pub fn translate_pin_block(ctx: &HsmContext, cmd: &Command) -> Result<Response, HsmError> {
    let mut reader = PayloadReader::new(&cmd.payload);
    let source_key = reader.key("source key")?;
    let dest_key = reader.key("destination key")?;
    let pin_block = read_pin_block(&mut reader)?;
    let source_code = reader.ascii(2, "source PIN block format")?;
    let dest_code = reader.ascii(2, "destination PIN block format")?;
    reader.ascii(12, "account number")?;

    // Blocks pass through unchanged; the format codes only gate conversion
    if source_code != dest_code {
        return Err(HsmError::PinFormatConversion {
            from: source_code.to_string(),
            to: dest_code.to_string(),
        });
    }

    let clear = Zeroizing::new(TDesOperations::decrypt_block(source_key, &pin_block)?);
    let translated = TDesOperations::encrypt_block(dest_key, &clear[..])?;

    ctx.audit().log(
        "THALES_BU",
        json!({
            "sourcePinBlockFormat": source_code,
            "destPinBlockFormat": dest_code,
        }),
        AuditLevel::Info,
    );

    Ok(Response::success(cmd, hex::encode_upper(translated).into_bytes()))
}

/// CA - Verify a PIN with the IBM 3624 offset method
///
/// Payload: ZPK (scheme + key), PVK (16), PIN block (16 hex), format (2),
/// check length (2), account (12), decimalization table (16), validation
/// data (12), offset (12).
pub fn verify_pin(ctx: &HsmContext, cmd: &Command) -> Result<Response, HsmError> {
    let mut reader = PayloadReader::new(&cmd.payload);
    let zpk = reader.key("ZPK")?;
    let pvk = reader.take(PVK_LEN, "PVK")?;
    let pin_block = read_pin_block(&mut reader)?;
    let format = PinBlockFormat::from_code(reader.ascii(2, "PIN block format")?)?;
    let check_len = reader.decimal(2, "check length")?;
    let account = reader.ascii(12, "account number")?;
    let table = reader.ascii(16, "decimalization table")?;
    let validation_data = reader.ascii(12, "PIN validation data")?;
    let offset = reader.ascii(12, "PIN offset")?;

    let clear = Zeroizing::new(TDesOperations::decrypt_block(zpk, &pin_block)?);
    let candidate = Zeroizing::new(extract_pin(format, &clear, account)?);
    let natural = Zeroizing::new(natural_pin(pvk, validation_data, table, check_len)?);
    let verified = verify_with_offset(&candidate, &natural, offset, check_len)?;

    ctx.audit().log(
        "THALES_CA",
        json!({ "pinBlockFormat": format.code(), "verified": verified }),
        if verified { AuditLevel::Info } else { AuditLevel::Security },
    );

    if verified {
        Ok(Response::ok(cmd))
    } else {
        Ok(Response::error(cmd, ErrorCode::VERIFICATION_FAILURE))
    }
}

fn read_pin_block(reader: &mut PayloadReader<'_>) -> Result<[u8; 8], HsmError> {
    let text = reader.ascii(PIN_BLOCK_CHARS, "PIN block")?;
    let mut block = [0u8; 8];
    hex::decode_to_slice(text, &mut block).map_err(|_| HsmError::InvalidHex { field: "PIN block" })?;
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::audit::MemoryAuditLogger;
    use crate::keys::{InMemoryKeyStore, Lmk};
    use crate::pin::build_pin_block;

    const ZPK: &str = "0123456789ABCDEFFEDCBA9876543210";
    const ZPK2: &str = "89ABCDEF0123456776543210FEDCBA98";
    const PVK: &str = "0123456789ABCDEFFEDCBA9876543210";
    const ACCOUNT: &str = "111111111111";

    fn ctx() -> HsmContext {
        HsmContext::new(
            Lmk::new(&[0x01; 16]).unwrap(),
            Arc::new(InMemoryKeyStore::default()),
            Arc::new(MemoryAuditLogger::new()),
        )
    }

    fn encrypted_block(key: &[u8], format: PinBlockFormat, pin: &str) -> String {
        let clear = build_pin_block(format, pin, ACCOUNT).unwrap();
        hex::encode_upper(TDesOperations::encrypt_block(key, &clear).unwrap())
    }

    fn ca_payload(pin: &str, offset: &str) -> Vec<u8> {
        let zpk = hex::decode(ZPK).unwrap();
        let mut payload = vec![b'U'];
        payload.extend_from_slice(&zpk);
        payload.extend_from_slice(&hex::decode(PVK).unwrap());
        payload.extend_from_slice(encrypted_block(&zpk, PinBlockFormat::Iso0, pin).as_bytes());
        payload.extend_from_slice(b"01");
        payload.extend_from_slice(b"04");
        payload.extend_from_slice(ACCOUNT.as_bytes());
        payload.extend_from_slice(b"0123456789012345");
        payload.extend_from_slice(b"411111111111");
        payload.extend_from_slice(offset.as_bytes());
        payload
    }

    fn bu_payload(source: &str, dest: &str) -> Vec<u8> {
        let zpk = hex::decode(ZPK).unwrap();
        let block = encrypted_block(&zpk, PinBlockFormat::Iso0, "1234");
        bu_payload_with_block(&block, source, dest)
    }

    fn bu_payload_with_block(block: &str, source: &str, dest: &str) -> Vec<u8> {
        let mut payload = vec![b'U'];
        payload.extend_from_slice(&hex::decode(ZPK).unwrap());
        payload.push(b'U');
        payload.extend_from_slice(&hex::decode(ZPK2).unwrap());
        payload.extend_from_slice(block.as_bytes());
        payload.extend_from_slice(source.as_bytes());
        payload.extend_from_slice(dest.as_bytes());
        payload.extend_from_slice(ACCOUNT.as_bytes());
        payload
    }

    #[test]
    fn test_verify_pin_natural() {
        // Natural PIN for this PVK and validation data is 1020
        let cmd = Command::new(*b"0001", *b"CA", ca_payload("1020", "000000000000"));
        let response = verify_pin(&ctx(), &cmd).unwrap();
        assert_eq!(response.to_bytes(), b"0001CB".to_vec());
    }

    #[test]
    fn test_verify_pin_with_offset() {
        // 1020 + 4321 = 5341
        let cmd = Command::new(*b"0001", *b"CA", ca_payload("5341", "4321FFFFFFFF"));
        assert!(verify_pin(&ctx(), &cmd).unwrap().is_okay());
    }

    #[test]
    fn test_verify_pin_mismatch() {
        let cmd = Command::new(*b"0001", *b"CA", ca_payload("1021", "000000000000"));
        let response = verify_pin(&ctx(), &cmd).unwrap();
        assert!(response.is_verification_failure());
    }

    #[test]
    fn test_translate_same_format() {
        let cmd = Command::new(*b"0001", *b"BU", bu_payload("01", "01"));
        let response = translate_pin_block(&ctx(), &cmd).unwrap();
        assert_eq!(&response.status, b"BV");

        let expected = encrypted_block(&hex::decode(ZPK2).unwrap(), PinBlockFormat::Iso0, "1234");
        assert_eq!(response.data, expected.into_bytes());
    }

    #[test]
    fn test_translate_same_code_outside_known_formats() {
        let zpk = hex::decode(ZPK).unwrap();
        let zpk2 = hex::decode(ZPK2).unwrap();
        let block = "0123456789ABCDEF";
        let clear = TDesOperations::decrypt_block(&zpk, &hex::decode(block).unwrap()).unwrap();
        let expected = hex::encode_upper(TDesOperations::encrypt_block(&zpk2, &clear).unwrap());

        for code in ["03", "01"] {
            let cmd = Command::new(*b"0001", *b"BU", bu_payload_with_block(block, code, code));
            let response = translate_pin_block(&ctx(), &cmd).unwrap();
            assert_eq!(&response.status, b"BV");
            assert_eq!(response.data, expected.clone().into_bytes());
        }
    }

    #[test]
    fn test_translate_format_conversion_rejected() {
        let cmd = Command::new(*b"0001", *b"BU", bu_payload("01", "47"));
        match translate_pin_block(&ctx(), &cmd) {
            Err(err) => assert_eq!(
                err.to_string(),
                "PIN block format conversion not implemented (01 -> 47)"
            ),
            Ok(response) => panic!("unexpected response: {:?}", response),
        }
    }

    #[test]
    fn test_translate_bad_pin_block_hex() {
        let mut payload = bu_payload("01", "01");
        payload[34] = b'G';
        let cmd = Command::new(*b"0001", *b"BU", payload);
        assert!(matches!(
            translate_pin_block(&ctx(), &cmd),
            Err(HsmError::InvalidHex { field: "PIN block" })
        ));
    }
}
