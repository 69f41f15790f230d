//! Key management commands
//!
//! `A0` generates a working key and returns it wrapped under the LMK.
//! `FA` imports a key encrypted under a zone master key, re-wraps it under
//! the LMK and keeps it in the key store.
//!
//! Both respond with `scheme tag | key under LMK | KCV (3 bytes)`.

use rand::RngCore;
use serde_json::json;
use zeroize::Zeroizing;

use crate::audit::AuditLevel;
use crate::command::{Command, Response};
use crate::crypto::{key_check_value, TDesOperations, KCV_LEN};
use crate::keys::KeyScheme;
use crate::thales::{HsmContext, HsmError, PayloadReader};

/// A0 - Generate a key
///
/// Payload: key type (1), key scheme (1). `T` yields 192 bits, `X` 256 bits
/// and anything else 128 bits. The scheme byte is echoed as received.
pub fn generate_key(ctx: &HsmContext, cmd: &Command) -> Result<Response, HsmError> {
    let mut reader = PayloadReader::new(&cmd.payload);
    let key_type = reader.byte("key type")?;
    let scheme_tag = reader.byte("key scheme")?;
    let scheme = match scheme_tag {
        b'T' => KeyScheme::Triple,
        b'X' => KeyScheme::Extended,
        _ => KeyScheme::Double,
    };

    let mut key = Zeroizing::new(vec![0u8; scheme.key_len()]);
    rand::thread_rng().fill_bytes(&mut key[..]);

    let wrapped = ctx.lmk().wrap(&key)?;
    let kcv = key_check_value(&key)?;

    ctx.audit().log(
        "THALES_A0",
        json!({
            "keyType": char::from(key_type).to_string(),
            "keyScheme": char::from(scheme_tag).to_string(),
            "keyLength": scheme.key_bits(),
            "kcv": hex::encode_upper(kcv),
        }),
        AuditLevel::Security,
    );

    Ok(Response::success(cmd, wrapped_response(scheme_tag, &wrapped, &kcv)))
}

/// FA - Import a key from ZMK to LMK
///
/// Payload: key type (3), scheme (1), ZMK, key under ZMK. The scheme gives
/// the width of both key fields.
pub fn import_key(ctx: &HsmContext, cmd: &Command) -> Result<Response, HsmError> {
    let mut reader = PayloadReader::new(&cmd.payload);
    let key_type = reader.ascii(3, "key type")?;
    let (scheme, zmk) = reader.key_with_scheme("ZMK")?;
    let encrypted = reader.take(scheme.key_len(), "key under ZMK")?;

    let clear = Zeroizing::new(TDesOperations::decrypt_ecb(zmk, encrypted)?);
    let wrapped = ctx.lmk().wrap(&clear)?;
    let kcv = key_check_value(&clear)?;
    let kcv_hex = hex::encode_upper(kcv);
    let scheme_tag = char::from(scheme.tag()).to_string();

    let key_id = ctx.next_key_id();
    ctx.key_store().store_key(
        &key_id,
        &clear,
        key_type,
        Some(json!({ "kcv": kcv_hex, "scheme": scheme_tag })),
    )?;

    ctx.audit().log(
        "THALES_FA",
        json!({
            "keyType": key_type,
            "keyScheme": scheme_tag,
            "keyId": key_id,
            "kcv": kcv_hex,
        }),
        AuditLevel::Security,
    );

    Ok(Response::success(cmd, wrapped_response(scheme.tag(), &wrapped, &kcv)))
}

fn wrapped_response(scheme_tag: u8, wrapped: &[u8], kcv: &[u8; KCV_LEN]) -> Vec<u8> {
    let mut data = Vec::with_capacity(1 + wrapped.len() + KCV_LEN);
    data.push(scheme_tag);
    data.extend_from_slice(wrapped);
    data.extend_from_slice(kcv);
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::audit::MemoryAuditLogger;
    use crate::crypto::tdes::set_odd_parity;
    use crate::keys::{InMemoryKeyStore, KeyStore, Lmk};

    const LMK: [u8; 32] = [0x5A; 32];

    fn setup() -> (HsmContext, Arc<InMemoryKeyStore>) {
        let store = Arc::new(InMemoryKeyStore::default());
        let ctx = HsmContext::new(
            Lmk::new(&LMK).unwrap(),
            store.clone(),
            Arc::new(MemoryAuditLogger::new()),
        );
        (ctx, store)
    }

    #[test]
    fn test_generate_key_lengths() {
        let (ctx, _) = setup();
        let lmk = Lmk::new(&LMK).unwrap();
        for (tag, key_len, wrapped_len) in [(b'U', 16, 32), (b'T', 24, 32), (b'X', 32, 48), (b'Q', 16, 32)] {
            let cmd = Command::new(*b"0001", *b"A0", vec![b'0', tag]);
            let response = generate_key(&ctx, &cmd).unwrap();
            assert_eq!(&response.status, b"A1");
            assert_eq!(response.data[0], tag);
            assert_eq!(response.data.len(), 1 + wrapped_len + KCV_LEN);

            let wrapped = &response.data[1..1 + wrapped_len];
            let clear = lmk.unwrap_key(wrapped).unwrap();
            assert_eq!(clear.len(), key_len);
            assert_eq!(&response.data[1 + wrapped_len..], &key_check_value(&clear).unwrap());
        }
    }

    #[test]
    fn test_generate_key_unknown_scheme_echoed_as_received() {
        let (ctx, _) = setup();
        for tag in [b'Z', b'Q'] {
            let cmd = Command::new(*b"0001", *b"A0", vec![b'0', tag]);
            let response = generate_key(&ctx, &cmd).unwrap();
            assert_eq!(response.data[0], tag);

            // Still a double-length key underneath
            let clear = Lmk::new(&LMK).unwrap().unwrap_key(&response.data[1..33]).unwrap();
            assert_eq!(clear.len(), 16);
        }
    }

    #[test]
    fn test_import_key() {
        let (ctx, store) = setup();
        let zmk = hex::decode("0123456789ABCDEFFEDCBA9876543210").unwrap();
        let mut clear = hex::decode("11111111111111112222222222222222").unwrap();
        set_odd_parity(&mut clear);
        let encrypted = TDesOperations::encrypt_ecb(&zmk, &clear).unwrap();

        let mut payload = b"001U".to_vec();
        payload.extend_from_slice(&zmk);
        payload.extend_from_slice(&encrypted);
        let response = import_key(&ctx, &Command::new(*b"0001", *b"FA", payload)).unwrap();

        assert_eq!(&response.status, b"FB");
        assert_eq!(response.data[0], b'U');
        let unwrapped = Lmk::new(&LMK).unwrap().unwrap_key(&response.data[1..33]).unwrap();
        assert_eq!(unwrapped.as_slice(), clear.as_slice());
        assert_eq!(&response.data[33..], &key_check_value(&clear).unwrap());

        assert_eq!(store.key_count(), 1);
        let id = &store.list_keys()[0];
        let info = store.get_key_info(id).unwrap();
        assert_eq!(info.key_type, "001");
        assert_eq!(info.metadata.unwrap()["kcv"], hex::encode_upper(key_check_value(&clear).unwrap()));
    }

    #[test]
    fn test_import_key_truncated() {
        let (ctx, store) = setup();
        let mut payload = b"001U".to_vec();
        payload.extend_from_slice(&[0u8; 20]);
        let result = import_key(&ctx, &Command::new(*b"0001", *b"FA", payload));
        assert!(matches!(result, Err(HsmError::Truncated { field: "key under ZMK", .. })));
        assert_eq!(store.key_count(), 0);
    }
}
