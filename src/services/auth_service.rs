//! Domain service for authentication.
//!
//! Verifies login credentials and issues session tokens. Request-time token
//! checks live in [`crate::services::AccessGuard`].

use serde::Serialize;
use thiserror::Error;

use crate::domain::Role;
use crate::services::token::TokenError;

/// Errors specific to authentication and authorization.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown account or wrong password. Deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No bearer token was supplied.
    #[error("Authentication required")]
    Unauthenticated,

    /// Token rejected, or the caller lacks the required role or ownership.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encode(msg) => Self::Internal(msg),
            other => Self::Forbidden(other.to_string()),
        }
    }
}

/// Successful login: the session token plus the account it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub account_id: i32,
    pub role: Role,
    pub username: String,
    pub expires_at: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies a (username, password, role) triple and issues a session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if no account matches the
    /// username and role, or the password is wrong. Store failures surface as
    /// [`AuthError::Database`] or [`AuthError::Internal`].
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<LoginResult, AuthError>;
}
