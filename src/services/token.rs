//! Signed, time-limited session tokens.
//!
//! A token is `<payload>.<signature>`, both URL-safe base64 without padding.
//! The payload is the JSON-encoded [`SessionClaims`]; the signature is
//! HMAC-SHA256 over the encoded payload. Tokens are stateless: nothing is
//! stored server-side, so expiry is the only way a token stops working.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::domain::{Identity, Role};

type HmacSha256 = Hmac<Sha256>;

/// Claims embedded in every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account ID.
    pub sub: i32,
    pub username: String,
    pub role: Role,
    /// Issued-at (Unix timestamp, milliseconds).
    pub iat: i64,
    /// Expiry (Unix timestamp, milliseconds). The token is rejected at or after this instant.
    pub exp: i64,
}

impl From<SessionClaims> for Identity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            account_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed session token")]
    Malformed,

    #[error("session token signature mismatch")]
    BadSignature,

    #[error("session token expired")]
    Expired,

    #[error("failed to encode session token: {0}")]
    Encode(String),
}

/// Issues and verifies session tokens under a single process-wide key.
pub struct TokenCodec {
    key: Vec<u8>,
    ttl: Duration,
}

impl TokenCodec {
    #[must_use]
    pub fn new(key: &[u8], ttl: Duration) -> Self {
        Self {
            key: key.to_vec(),
            ttl,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> anyhow::Result<Self> {
        let key = config.signing_key()?;
        Ok(Self::new(
            key,
            Duration::hours(i64::from(config.token_ttl_hours)),
        ))
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    pub fn issue_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        // Claims carry milliseconds; anything finer would be lost on the round trip.
        let now = now.trunc_subsecs(3);
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Encode("token expiry out of range".to_string()))?;
        let claims = SessionClaims {
            sub: identity.account_id,
            username: identity.username.clone(),
            role: identity.role,
            iat: now.timestamp_millis(),
            exp: expires_at.timestamp_millis(),
        };

        let payload =
            serde_json::to_vec(&claims).map_err(|e| TokenError::Encode(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(payload);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes())?);

        Ok(IssuedToken {
            token: format!("{payload}.{signature}"),
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature first, then expiry relative to `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if now.timestamp_millis() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        // HMAC accepts keys of any length; this only fails for an unusable key type.
        HmacSha256::new_from_slice(&self.key).map_err(|e| TokenError::Encode(e.to_string()))
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, TokenError> {
        let mut mac = self.mac()?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
