//! Signed session token.
//!
//! The token is an open JSON object: whatever the login endpoint returns is
//! merged on top of it, and the UI session is projected out of it. Signing is
//! plain HS256 with the configured session secret.

use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;
use uuid::Uuid;

use painel_common::models::{Session, SessionUser};

use crate::Error;

pub type TokenClaims = serde_json::Map<String, Value>;

#[derive(Clone)]
pub struct SessionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    max_age: chrono::Duration,
}

impl SessionSigner {
    pub fn new(secret: &str, max_age: chrono::Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            max_age,
        }
    }

    /// Empty token with `iat`, `exp` and a unique `jti`.
    pub fn fresh_claims(&self) -> TokenClaims {
        let now = Utc::now();
        let mut claims = TokenClaims::new();
        claims.insert("iat".into(), Value::from(now.timestamp()));
        claims.insert("exp".into(), Value::from((now + self.max_age).timestamp()));
        claims.insert("jti".into(), Value::from(Uuid::new_v4().to_string()));
        claims
    }

    pub fn sign(&self, claims: &TokenClaims) -> Result<String, Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| Error::Token(e.to_string()))
    }

    /// Checks signature and expiry and hands back the claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, Error> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Error::Token(e.to_string()))
    }
}

/// Merges a freshly returned user payload on top of the token. Later keys win;
/// without a payload the token is returned unchanged.
pub fn merge_user(mut token: TokenClaims, user: Option<TokenClaims>) -> TokenClaims {
    if let Some(user) = user {
        for (key, value) in user {
            token.insert(key, value);
        }
    }
    token
}

/// Projects the embedded user object and both tokens into a `Session`.
pub fn project_session(token: &TokenClaims) -> Session {
    let user = token
        .get("user")
        .filter(|v| v.is_object())
        .and_then(|v| serde_json::from_value::<SessionUser>(v.clone()).ok())
        .unwrap_or_default();
    let string_claim = |key: &str| {
        token
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    let expires = token
        .get("exp")
        .and_then(|v| v.as_i64())
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .unwrap_or_else(Utc::now);

    Session {
        user,
        access_token: string_claim("access_token"),
        refresh_token: string_claim("refresh_token"),
        expires,
    }
}
