//! Unverified decoding of the credential payload.
//!
//! The decoded claims only drive what the UI offers. Nothing here checks the
//! signature, so the result must never be used to authenticate anyone; the
//! API validates the token on every request.

use std::string::FromUtf8Error;

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Decoded payload fields of a credential.
pub type Claims = Map<String, Value>;

// Standard alphabet with browser `atob` leniency: padding optional, stray
// trailing bits ignored.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Error)]
pub(crate) enum DecodeFailure {
    #[error("credential has no payload segment")]
    MissingPayload,
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload JSON is not an object")]
    NotAnObject,
}

/// Decode the claims of `credential`, falling back to an empty map on any
/// malformed input.
pub fn decode_claims(credential: &str) -> Claims {
    match try_decode_claims(credential) {
        Ok(claims) => claims,
        Err(reason) => {
            debug!(%reason, "credential payload not decodable, using empty claims");
            Claims::new()
        }
    }
}

pub(crate) fn try_decode_claims(credential: &str) -> Result<Claims, DecodeFailure> {
    let segment = credential
        .split('.')
        .nth(1)
        .ok_or(DecodeFailure::MissingPayload)?;
    let standard = segment.replace('-', "+").replace('_', "/");
    let bytes = LENIENT_BASE64.decode(standard)?;
    let text = String::from_utf8(bytes)?;
    match serde_json::from_str::<Value>(&text)? {
        Value::Object(claims) => Ok(claims),
        _ => Err(DecodeFailure::NotAnObject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.signature",
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn decodes_real_signed_token_without_the_key() {
        let claims = json!({ "sub": "maria", "role": "RECEPTIONIST", "exp": 4_102_444_800u64 });
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef"),
        )
        .expect("token should encode");

        let decoded = decode_claims(&token);
        assert_eq!(decoded.get("sub"), Some(&json!("maria")));
        assert_eq!(decoded.get("role"), Some(&json!("RECEPTIONIST")));
    }

    #[test]
    fn handles_url_safe_characters_and_missing_padding() {
        let dash = token_with_payload(r#"{"note":"??>","n":1}"#);
        assert!(dash.contains("Pz8-"));
        assert_eq!(decode_claims(&dash).get("note"), Some(&json!("??>")));

        let underscore = token_with_payload(r#"{"role":"DOCTOR","q":"ÿÿ"}"#);
        assert!(underscore.contains("O_w78"));
        assert_eq!(decode_claims(&underscore).get("role"), Some(&json!("DOCTOR")));
    }

    #[test]
    fn decodes_non_ascii_text() {
        let token = token_with_payload(r#"{"name":"João Conceição"}"#);
        assert_eq!(
            decode_claims(&token).get("name"),
            Some(&json!("João Conceição"))
        );
    }

    #[test]
    fn two_segments_are_enough() {
        let token = format!("header.{}", URL_SAFE_NO_PAD.encode(r#"{"role":"ADMIN"}"#));
        assert_eq!(decode_claims(&token).get("role"), Some(&json!("ADMIN")));
    }

    #[test]
    fn malformed_credentials_yield_empty_claims() {
        let not_utf8 = format!("h.{}.s", URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd]));
        let cases = [
            String::new(),
            "no-dots-at-all".to_string(),
            "header..signature".to_string(),
            "header.***.signature".to_string(),
            "header.a.signature".to_string(),
            not_utf8,
            token_with_payload("{not json"),
            token_with_payload("[1,2,3]"),
            token_with_payload("\"just a string\""),
            token_with_payload("null"),
        ];

        for credential in cases {
            assert!(
                decode_claims(&credential).is_empty(),
                "expected empty claims for {credential:?}"
            );
        }
    }

    #[test]
    fn reports_failure_reason_internally() {
        assert!(matches!(
            try_decode_claims("only-one-segment"),
            Err(DecodeFailure::MissingPayload)
        ));
        assert!(matches!(
            try_decode_claims(&token_with_payload("42")),
            Err(DecodeFailure::NotAnObject)
        ));
    }
}
