//! Bearer token decoding.
//!
//! Tokens issued by the backend are JWTs. Only the payload's `exp` claim is
//! read; the signature is the backend's business.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not a three-part JWT")]
    Malformed,

    #[error("token payload is not valid base64")]
    Encoding,

    #[error("token payload is not a JSON object")]
    Payload,

    #[error("token carries no usable expiry")]
    MissingExpiry,
}

#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<serde_json::Number>,
}

/// A bearer token together with the expiry embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    raw: String,
    expires_at: DateTime<Utc>,
}

impl SessionToken {
    /// Decode the expiry from a raw token. A leading `Bearer ` is tolerated.
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        let raw = raw.trim();
        let raw = raw.strip_prefix("Bearer ").unwrap_or(raw);

        let mut parts = raw.split('.');
        let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(payload), Some(_), None) if !header.is_empty() => payload,
            _ => return Err(TokenError::Malformed),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| TokenError::Encoding)?;
        let claims: Claims = serde_json::from_slice(&bytes).map_err(|_| TokenError::Payload)?;

        let exp = claims.exp.ok_or(TokenError::MissingExpiry)?;
        let seconds = exp
            .as_i64()
            .or_else(|| exp.as_f64().map(|f| f.trunc() as i64))
            .ok_or(TokenError::MissingExpiry)?;
        let expires_at =
            DateTime::<Utc>::from_timestamp(seconds, 0).ok_or(TokenError::MissingExpiry)?;

        Ok(Self {
            raw: raw.to_string(),
            expires_at,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Time left until expiry; negative once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    /// Expired as soon as `expires_at - now <= 0`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now) <= Duration::zero()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::token_expiring_at;
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    #[test]
    fn test_parse_reads_exp_claim() {
        let raw = token_expiring_at(at(1_900_000_000));
        let token = SessionToken::parse(&raw).expect("token should parse");
        assert_eq!(token.expires_at(), at(1_900_000_000));
        assert_eq!(token.as_str(), raw);
    }

    #[test]
    fn test_parse_strips_bearer_prefix() {
        let raw = token_expiring_at(at(1_900_000_000));
        let token = SessionToken::parse(&format!("Bearer {}", raw)).expect("token should parse");
        assert_eq!(token.as_str(), raw);
    }

    #[test]
    fn test_parse_accepts_padded_payload_and_float_exp() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let payload = base64::engine::general_purpose::URL_SAFE.encode(br#"{"exp":1900000000.75}"#);
        let token = SessionToken::parse(&format!("{}.{}.sig", header, payload))
            .expect("padded payload should parse");
        assert_eq!(token.expires_at(), at(1_900_000_000));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(SessionToken::parse(""), Err(TokenError::Malformed));
        assert_eq!(SessionToken::parse("opaque-token"), Err(TokenError::Malformed));
        assert_eq!(SessionToken::parse("a.b.c.d"), Err(TokenError::Malformed));
        assert_eq!(SessionToken::parse("a.!!!.c"), Err(TokenError::Encoding));

        let not_json = URL_SAFE_NO_PAD.encode(b"hello");
        assert_eq!(
            SessionToken::parse(&format!("a.{}.c", not_json)),
            Err(TokenError::Payload)
        );

        let no_exp = URL_SAFE_NO_PAD.encode(br#"{"sub":"admin"}"#);
        assert_eq!(
            SessionToken::parse(&format!("a.{}.c", no_exp)),
            Err(TokenError::MissingExpiry)
        );
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let token = SessionToken::parse(&token_expiring_at(at(1_000))).expect("token should parse");
        assert!(!token.is_expired(at(999)));
        assert!(token.is_expired(at(1_000)));
        assert!(token.is_expired(at(1_001)));
        assert_eq!(token.remaining(at(940)), Duration::seconds(60));
    }
}
