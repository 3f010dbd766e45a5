//! Token service: issues and verifies signed identity tokens
//!
//! Tokens are HS256 JWTs carrying the user id as `sub` plus an expiry.
//! Nothing is persisted; validity is a function of signature and expiry only.

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

const DEFAULT_TTL_SECS: i64 = 60 * 60;
const ISSUER: &str = "quill";

/// Why a token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token malformed")]
    Malformed,
    #[error("token signature invalid")]
    SignatureInvalid,
}

/// Token service configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC signing secret
    pub secret: String,
    /// Token lifetime in seconds
    pub ttl_secs: i64,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    /// Create a config from an expiry string such as "1h" or "15m".
    /// Unparseable strings fall back to one hour.
    pub fn with_expiry_string(secret: impl Into<String>, expiry: &str) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs: parse_duration_string(expiry).unwrap_or(DEFAULT_TTL_SECS),
        }
    }
}

/// Parse duration strings like "15m", "7d", "24h" to seconds
pub fn parse_duration_string(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.len() < 2 {
        return None;
    }

    let (num_str, unit) = s.split_at(s.len() - 1);
    let num: i64 = num_str.parse().ok()?;
    if num <= 0 {
        return None;
    }

    match unit {
        "s" => Some(num),
        "m" => Some(num * 60),
        "h" => Some(num * 3600),
        "d" => Some(num * 24 * 3600),
        "w" => Some(num * 7 * 24 * 3600),
        _ => None,
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: Uuid,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

/// Issues and verifies identity tokens against a fixed secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        // Expiry is exact: a token is invalid the second its window closes.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl_secs: config.ttl_secs,
        }
    }

    /// Token lifetime in seconds
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for `user_id`, valid from now for the configured lifetime
    pub fn issue(&self, user_id: Uuid) -> ApiResult<String> {
        self.issue_at(user_id, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `issued_at`
    pub fn issue_at(&self, user_id: Uuid, issued_at: i64) -> ApiResult<String> {
        let claims = Claims {
            sub: user_id,
            iat: issued_at,
            exp: issued_at + self.ttl_secs,
            iss: ISSUER.to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("token encoding failed: {}", e)))
    }

    /// Verify a token and return the user id it names
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Token verification failed");
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                _ => TokenError::Malformed,
            }
        })?;

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-for-token-service-unit-tests";

    fn service() -> TokenService {
        TokenService::new(TokenConfig::new(SECRET))
    }

    #[test]
    fn test_parse_duration_string() {
        assert_eq!(parse_duration_string("15m"), Some(900));
        assert_eq!(parse_duration_string("1h"), Some(3600));
        assert_eq!(parse_duration_string("7d"), Some(604800));
        assert_eq!(parse_duration_string("30s"), Some(30));
        assert_eq!(parse_duration_string("1w"), Some(604800));
        assert_eq!(parse_duration_string(""), None);
        assert_eq!(parse_duration_string("h"), None);
        assert_eq!(parse_duration_string("0m"), None);
        assert_eq!(parse_duration_string("15x"), None);
    }

    #[test]
    fn test_invalid_expiry_uses_default() {
        let config = TokenConfig::with_expiry_string(SECRET, "soon");
        assert_eq!(config.ttl_secs, DEFAULT_TTL_SECS);
    }

    #[test]
    fn test_issue_then_verify_round_trips() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id).unwrap();
        assert_eq!(tokens.verify(&token), Ok(user_id));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        let issued_at = Utc::now().timestamp() - tokens.ttl_secs() - 1;
        let token = tokens.issue_at(Uuid::new_v4(), issued_at).unwrap();
        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_valid_until_window_closes() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let issued_at = Utc::now().timestamp() - tokens.ttl_secs() + 30;
        let token = tokens.issue_at(user_id, issued_at).unwrap();
        assert_eq!(tokens.verify(&token), Ok(user_id));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let other = TokenService::new(TokenConfig::new("another-secret-entirely-different"));
        let token = other.issue(Uuid::new_v4()).unwrap();
        assert_eq!(
            service().verify(&token),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert_eq!(service().verify("not-a-jwt"), Err(TokenError::Malformed));
        assert_eq!(service().verify(""), Err(TokenError::Malformed));
    }
}
