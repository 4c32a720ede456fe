//! JWT payload decoding for expiry checks.
//!
//! The backend signs tokens with HS256 and re-verifies them on every
//! request; the client only needs the `exp` claim to know when to refresh.
//! Signatures are deliberately not verified here - a forged expiry gains
//! an attacker nothing the server will accept.
//!
//! Any token that fails to decode is treated as expired. A credential we
//! cannot read is a credential we do not trust.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenDecodeError {
    #[error("token is not a three-part JWT")]
    MalformedToken,

    #[error("token payload is not valid base64: {0}")]
    InvalidBase64(String),

    #[error("token payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("token payload has no exp claim")]
    MissingExpiry,

    #[error("token exp claim is out of range: {0}")]
    ExpiryOutOfRange(i64),
}

/// Decoded JWT payload. Only `exp` drives client behavior; the rest is
/// carried for display and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Expiry as Unix seconds.
    pub exp: i64,
    /// "access" or "refresh" as issued by the backend.
    pub token_type: Option<String>,
    /// Username the token was issued to.
    pub sub: Option<String>,
    pub user_id: Option<i64>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    exp: Option<i64>,
    #[serde(rename = "type")]
    token_type: Option<String>,
    sub: Option<String>,
    user_id: Option<i64>,
    role: Option<String>,
}

/// Decode the payload segment of a JWT without verifying its signature.
pub fn decode(token: &str) -> Result<Claims, TokenDecodeError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenDecodeError::MalformedToken);
    };

    // JWTs use unpadded url-safe base64, but accept padded input too.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| URL_SAFE.decode(payload))
        .map_err(|err| TokenDecodeError::InvalidBase64(err.to_string()))?;

    let raw: RawClaims = serde_json::from_slice(&bytes)
        .map_err(|err| TokenDecodeError::InvalidJson(err.to_string()))?;

    let exp = raw.exp.ok_or(TokenDecodeError::MissingExpiry)?;

    Ok(Claims {
        exp,
        token_type: raw.token_type,
        sub: raw.sub,
        user_id: raw.user_id,
        role: raw.role,
    })
}

/// When the token expires, if its payload can be decoded.
pub fn expires_at(token: &str) -> Result<DateTime<Utc>, TokenDecodeError> {
    let claims = decode(token)?;
    DateTime::from_timestamp(claims.exp, 0).ok_or(TokenDecodeError::ExpiryOutOfRange(claims.exp))
}

/// True when the token's expiry falls within `within` from now.
/// Undecodable tokens count as expiring: fail closed, never open.
pub fn is_expiring_soon(token: &str, within: Duration) -> bool {
    match expires_at(token) {
        Ok(expiry) => expiry - Utc::now() <= within,
        Err(_) => true,
    }
}

/// True when the token's expiry has already passed (or it cannot be read).
pub fn is_expired(token: &str) -> bool {
    is_expiring_soon(token, Duration::zero())
}

/// Build an unsigned test token with the given expiry offset from now.
#[cfg(test)]
pub(crate) fn test_jwt(expires_in: Duration, token_type: &str) -> String {
    test_jwt_at((Utc::now() + expires_in).timestamp(), token_type)
}

#[cfg(test)]
pub(crate) fn test_jwt_at(exp: i64, token_type: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({
            "exp": exp,
            "type": token_type,
            "sub": "tester",
            "user_id": 7,
            "role": "USER",
        })
        .to_string(),
    );
    format!("{header}.{payload}.unsigned")
}
