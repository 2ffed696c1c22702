//! Request-boundary token verification.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::Identity;
use crate::services::auth_service::AuthError;
use crate::services::token::TokenCodec;

/// Turns the raw `Authorization` header of a request into an [`Identity`].
///
/// Stateless: every call verifies from scratch and nothing is cached between requests.
#[derive(Clone)]
pub struct AccessGuard {
    tokens: Arc<TokenCodec>,
}

impl AccessGuard {
    #[must_use]
    pub const fn new(tokens: Arc<TokenCodec>) -> Self {
        Self { tokens }
    }

    pub fn authorize(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        self.authorize_at(authorization, Utc::now())
    }

    /// Missing header or non-bearer scheme → `Unauthenticated`; any token
    /// that fails verification → `Forbidden`.
    pub fn authorize_at(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Identity, AuthError> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(AuthError::Unauthenticated)?;

        let claims = self.tokens.verify_at(token, now)?;
        Ok(claims.into())
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use chrono::Duration;

    fn guard() -> (AccessGuard, Arc<TokenCodec>) {
        let tokens = Arc::new(TokenCodec::new(
            b"guard-test-key-guard-test-key-00",
            Duration::hours(24),
        ));
        (AccessGuard::new(tokens.clone()), tokens)
    }

    fn admin() -> Identity {
        Identity {
            account_id: 1,
            username: "admin".to_string(),
            role: Role::Admin,
        }
    }

    #[test]
    fn missing_header_is_unauthenticated() {
        let (guard, _) = guard();
        assert!(matches!(
            guard.authorize(None),
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            guard.authorize(Some("Bearer ")),
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            guard.authorize(Some("Basic dXNlcjpwdw==")),
            Err(AuthError::Unauthenticated)
        ));
    }

    #[test]
    fn valid_token_yields_identity() {
        let (guard, tokens) = guard();
        let issued = tokens.issue(&admin()).unwrap();
        let header = format!("Bearer {}", issued.token);

        assert_eq!(guard.authorize(Some(&header)).unwrap(), admin());
    }

    #[test]
    fn invalid_or_expired_token_is_forbidden() {
        let (guard, tokens) = guard();
        assert!(matches!(
            guard.authorize(Some("Bearer not-a-token")),
            Err(AuthError::Forbidden(_))
        ));

        let issued_at = Utc::now() - Duration::hours(25);
        let issued = tokens.issue_at(&admin(), issued_at).unwrap();
        let header = format!("Bearer {}", issued.token);
        assert!(matches!(
            guard.authorize(Some(&header)),
            Err(AuthError::Forbidden(_))
        ));
    }

    #[test]
    fn expiry_boundary() {
        let (guard, tokens) = guard();
        let issued_at = Utc::now();
        let issued = tokens.issue_at(&admin(), issued_at).unwrap();
        let header = format!("Bearer {}", issued.token);
        let expiry = issued_at + tokens.ttl();

        assert!(
            guard
                .authorize_at(Some(&header), expiry - Duration::seconds(1))
                .is_ok()
        );
        assert!(guard.authorize_at(Some(&header), expiry).is_err());
    }
}
