//! Structural checks on JWT-shaped bearer tokens.
//!
//! Signatures are never verified on the client; the server does that.
//! These helpers only answer "does this look like a JWT" and
//! "has its `exp` claim passed".

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

/// Whether `token` decomposes into exactly three non-empty,
/// dot-separated base64url segments.
pub fn is_token_valid(token: &str) -> bool {
    let mut count = 0;
    for segment in token.split('.') {
        count += 1;
        if !is_base64url_segment(segment) {
            return false;
        }
    }
    count == 3
}

/// Whether the token's `exp` claim lies in the past.
///
/// Tokens whose payload can't be decoded, or which carry no numeric
/// `exp`, are reported as expired.
pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_at(token, Utc::now())
}

/// Same as [`is_token_expired`], against an explicit clock.
pub fn is_token_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    match expires_at(token) {
        Some(exp) => exp <= now,
        None => {
            tracing::debug!("Token payload has no readable exp claim, treating as expired");
            true
        }
    }
}

/// Read the `exp` claim (seconds since the epoch) of a token.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let payload = decode_payload(token)?;
    let exp = payload.get("exp")?.as_f64()?;
    if !exp.is_finite() {
        return None;
    }
    Utc.timestamp_opt(exp.trunc() as i64, 0).single()
}

fn decode_payload(token: &str) -> Option<Value> {
    if !is_token_valid(token) {
        return None;
    }
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn is_base64url_segment(segment: &str) -> bool {
    let body = segment.trim_end_matches('=');
    !body.is_empty()
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
