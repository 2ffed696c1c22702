//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::{Arc, OnceLock};

use anyhow::Context;
use async_trait::async_trait;
use tokio::task;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::db::repositories::account::{hash_password, verify_password};
use crate::domain::{Identity, Role};
use crate::services::auth_service::{AuthError, AuthService, LoginResult};
use crate::services::token::TokenCodec;

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenCodec>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, tokens: Arc<TokenCodec>) -> Self {
        Self { store, tokens }
    }
}

/// Hash checked when no account matches, so unknown usernames cost the same as wrong passwords.
fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        hash_password("supportsync-dummy-password", &SecurityConfig::default()).unwrap_or_default()
    })
}

async fn check_password(password: &str, password_hash: Option<String>) -> Result<bool, AuthError> {
    let password = password.to_string();

    // Argon2 is CPU-intensive; keep it off the async workers.
    let is_valid = task::spawn_blocking(move || match password_hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            let _ = verify_password(&password, dummy_hash());
            Ok(false)
        }
    })
    .await
    .context("Password verification task panicked")??;

    Ok(is_valid)
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<LoginResult, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let credentials = self.store.get_account_credentials(username, role).await?;

        let Some((account, password_hash)) = credentials else {
            check_password(password, None).await?;
            warn!(username, %role, "Login failed: no matching account");
            return Err(AuthError::InvalidCredentials);
        };

        if !check_password(password, Some(password_hash)).await? {
            warn!(username, %role, account_id = account.id, "Login failed: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let identity = Identity {
            account_id: account.id,
            username: account.username,
            role: account.role,
        };
        let issued = self.tokens.issue(&identity)?;

        info!(username = %identity.username, role = %identity.role, "Login successful");

        Ok(LoginResult {
            token: issued.token,
            account_id: identity.account_id,
            role: identity.role,
            username: identity.username,
            expires_at: issued.expires_at.to_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const KEY: &[u8] = b"test-signing-key-test-signing-key";

    fn fast_security() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    async fn service_with_accounts() -> (SeaOrmAuthService, Arc<TokenCodec>) {
        let store = Store::with_pool_options("sqlite::memory:", 1, 1)
            .await
            .unwrap();
        store
            .create_account("Om", "Om9", Role::User, &fast_security())
            .await
            .unwrap();
        store
            .create_account("admin", "admin123", Role::Admin, &fast_security())
            .await
            .unwrap();

        let tokens = Arc::new(TokenCodec::new(KEY, Duration::hours(24)));
        (SeaOrmAuthService::new(store, tokens.clone()), tokens)
    }

    #[tokio::test]
    async fn valid_login_issues_matching_token() {
        let (service, tokens) = service_with_accounts().await;

        let result = service.authenticate("admin", "admin123", Role::Admin).await.unwrap();
        assert_eq!(result.role, Role::Admin);
        assert_eq!(result.username, "admin");

        let claims = tokens.verify(&result.token).unwrap();
        assert_eq!(claims.sub, result.account_id);
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let (service, _) = service_with_accounts().await;
        let err = service.authenticate("Om", "om9", Role::User).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn wrong_role_is_invalid_credentials() {
        let (service, _) = service_with_accounts().await;
        let err = service.authenticate("Om", "Om9", Role::Admin).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_the_same() {
        let (service, _) = service_with_accounts().await;
        let unknown = service.authenticate("ghost", "x", Role::User).await.unwrap_err();
        let wrong = service.authenticate("Om", "x", Role::User).await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn store_failure_is_not_invalid_credentials() {
        let (service, _) = service_with_accounts().await;
        service.store.conn.clone().close().await.unwrap();

        let err = service.authenticate("Om", "Om9", Role::User).await.unwrap_err();
        assert!(!matches!(err, AuthError::InvalidCredentials));
    }
}
