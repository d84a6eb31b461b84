//! Access token decoding and freshness checks
//!
//! Tokens are decoded WITHOUT verifying their signature. The result is only
//! good for deciding when to refresh; it must never be treated as trusted
//! identity data. The portal API re-validates every token it receives.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims read from the payload segment of a bearer token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TokenClaims {
    /// Expiration time, seconds since the epoch
    pub exp: i64,
    /// Standard subject claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<Value>,
    /// Subject as issued by the portal API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    /// Issued at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// "access" or "refresh"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Anything else the issuer put in the payload
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    /// Subject identifier, preferring `sub` over `user_id`
    pub fn subject(&self) -> Option<String> {
        self.sub
            .as_ref()
            .or(self.user_id.as_ref())
            .and_then(|value| match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }

    /// Expiration as a UTC timestamp
    pub fn expires_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.exp, 0)
    }
}

/// Header fields of a token, when the header segment parses
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TokenMetadata {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl From<jsonwebtoken::Header> for TokenMetadata {
    fn from(header: jsonwebtoken::Header) -> Self {
        Self {
            alg: format!("{:?}", header.alg),
            typ: header.typ,
            kid: header.kid,
        }
    }
}

/// Result of decoding a token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DecodedToken {
    pub claims: TokenClaims,
    pub metadata: Option<TokenMetadata>,
}

/// Decode the payload of a bearer token without verifying it
///
/// Returns `None` for anything that is not at least `header.payload` with a
/// base64url JSON payload carrying a numeric `exp`. Safe to call on any string.
pub fn decode_token(token: &str) -> Option<DecodedToken> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: TokenClaims = serde_json::from_slice(&bytes).ok()?;

    let metadata = jsonwebtoken::decode_header(token)
        .ok()
        .map(TokenMetadata::from);

    Some(DecodedToken { claims, metadata })
}

/// Current wall-clock time in milliseconds since the epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Check if a token is expired
///
/// Tokens that fail to decode count as expired.
pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_with_leeway(token, 0)
}

/// Check if a token expires within `leeway_secs` from now
pub fn is_token_expired_with_leeway(token: &str, leeway_secs: i64) -> bool {
    match decode_token(token) {
        Some(decoded) => {
            // Widened so any i64 `exp` or leeway compares without overflow
            let exp_ms = i128::from(decoded.claims.exp) * 1000;
            exp_ms <= i128::from(now_millis()) + i128::from(leeway_secs) * 1000
        }
        None => true,
    }
}

/// Seconds of validity left, negative once expired. `None` if the token does not decode.
pub fn seconds_remaining(token: &str) -> Option<i64> {
    decode_token(token).map(|decoded| {
        let remaining_ms = i128::from(decoded.claims.exp) * 1000 - i128::from(now_millis());
        let remaining = remaining_ms.div_euclid(1000);
        i64::try_from(remaining).unwrap_or(if remaining > 0 { i64::MAX } else { i64::MIN })
    })
}
