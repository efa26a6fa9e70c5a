//! Token engine: issues and verifies HS256 bearer tokens.
//!
//! Tokens are compact JWTs (`header.payload.signature`, base64url, unpadded)
//! signed with a single symmetric secret. `iat` and `exp` travel as NumericDate
//! seconds, with `exp` rounded up so it is always after `iat`. The exact
//! expiry instant rides along as `exp_ms` and is what the engine checks.
//!
//! The engine is immutable after construction and safe to share across
//! concurrent requests.

use crate::{
    models::{Identity, Role},
    utils::{AuthError, ConfigError, JwtConfig},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use uuid::Uuid;

/// Minimum HMAC-SHA256 key size
pub const MIN_SECRET_BITS: usize = 256;

/// Claim names callers can never set through extra claims
const RESERVED_CLAIMS: [&str; 7] = ["sub", "iat", "exp", "exp_ms", "id", "name", "role"];

/// Token payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // email
    pub iat: i64,
    pub exp: i64,
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    /// Millisecond expiry; tokens without it expire at `exp` seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_ms: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    fn expires_at_ms(&self) -> i64 {
        self.exp_ms.unwrap_or_else(|| self.exp.saturating_mul(1000))
    }
}

/// Outcome of verifying a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid {
        subject: String,
        remaining_ttl: Duration,
    },
    Invalid,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid { .. })
    }
}

#[derive(Clone)]
pub struct TokenEngine {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_ms: i64,
}

impl TokenEngine {
    /// Build the engine from configuration, failing fast on a weak key or bad TTL
    pub fn new(config: &JwtConfig) -> Result<Self, ConfigError> {
        let secret = STANDARD.decode(config.secret_key.trim())?;
        Self::from_secret(&secret, config.expiration_ms)
    }

    /// Build the engine from raw key bytes
    pub fn from_secret(secret: &[u8], ttl_ms: u64) -> Result<Self, ConfigError> {
        let bits = secret.len() * 8;
        if bits < MIN_SECRET_BITS {
            return Err(ConfigError::SecretTooShort { bits });
        }
        if ttl_ms == 0 {
            return Err(ConfigError::NonPositiveTtl);
        }
        let ttl_ms = i64::try_from(ttl_ms).map_err(|_| ConfigError::Invalid {
            name: "JWT_EXPIRATION_MS",
            reason: format!("{ttl_ms} exceeds the supported range"),
        })?;

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked here with millisecond precision.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_ms,
        })
    }

    /// Configured token lifetime
    pub fn expiration_time(&self) -> Duration {
        Duration::from_millis(self.ttl_ms.unsigned_abs())
    }

    /// Issue a signed token for an identity
    pub fn issue(
        &self,
        identity: &Identity,
        extra_claims: Option<Map<String, Value>>,
    ) -> Result<String, AuthError> {
        self.issue_at(identity, extra_claims, now_ms())
    }

    pub(crate) fn issue_at(
        &self,
        identity: &Identity,
        extra_claims: Option<Map<String, Value>>,
        now_ms: i64,
    ) -> Result<String, AuthError> {
        if identity.email.trim().is_empty() {
            return Err(AuthError::Malformed);
        }

        let mut extra = extra_claims.unwrap_or_default();
        for reserved in RESERVED_CLAIMS {
            extra.remove(reserved);
        }

        let expires_at_ms = now_ms.saturating_add(self.ttl_ms);
        let claims = Claims {
            sub: identity.email.clone(),
            iat: now_ms.div_euclid(1000),
            exp: ceil_seconds(expires_at_ms),
            id: identity.id,
            name: identity.name.clone(),
            role: identity.role,
            exp_ms: Some(expires_at_ms),
            extra,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Unexpected(format!("failed to sign token: {e}")))
    }

    /// Verify signature and expiry and return the payload
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode_at(token, now_ms())
    }

    pub(crate) fn decode_at(&self, token: &str, now_ms: i64) -> Result<Claims, AuthError> {
        // jsonwebtoken compares HS256 signatures in constant time
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Malformed,
            }
        })?;
        let claims = data.claims;

        if claims.sub.is_empty() || claims.exp <= claims.iat {
            return Err(AuthError::Malformed);
        }
        // exp_ms may tighten exp but never extend it
        if claims
            .exp_ms
            .is_some_and(|ms| ms > claims.exp.saturating_mul(1000))
        {
            return Err(AuthError::Malformed);
        }
        if now_ms >= claims.expires_at_ms() {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    pub fn verify(&self, token: &str) -> Verification {
        self.verify_at(token, now_ms())
    }

    pub(crate) fn verify_at(&self, token: &str, now_ms: i64) -> Verification {
        match self.decode_at(token, now_ms) {
            Ok(claims) => Verification::Valid {
                remaining_ttl: remaining(&claims, now_ms),
                subject: claims.sub,
            },
            Err(_) => Verification::Invalid,
        }
    }

    pub fn extract_subject(&self, token: &str) -> Result<String, AuthError> {
        self.decode(token).map(|claims| claims.sub)
    }

    /// True only for a well-formed, unexpired token issued to `expected_subject`
    pub fn is_valid(&self, token: &str, expected_subject: &str) -> bool {
        self.decode(token)
            .map(|claims| claims.sub == expected_subject)
            .unwrap_or(false)
    }

    /// Time left before expiry; zero for expired or unverifiable tokens
    pub fn remaining_ttl(&self, token: &str) -> Duration {
        self.remaining_ttl_at(token, now_ms())
    }

    pub(crate) fn remaining_ttl_at(&self, token: &str, now_ms: i64) -> Duration {
        self.decode_at(token, now_ms)
            .map(|claims| remaining(&claims, now_ms))
            .unwrap_or(Duration::ZERO)
    }
}

fn remaining(claims: &Claims, now_ms: i64) -> Duration {
    let left = claims.expires_at_ms().saturating_sub(now_ms).max(0);
    Duration::from_millis(left as u64)
}

fn ceil_seconds(ms: i64) -> i64 {
    ms.div_euclid(1000) + i64::from(ms.rem_euclid(1000) != 0)
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
