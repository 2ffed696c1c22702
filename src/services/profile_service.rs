//! Domain service for account profiles.
//!
//! Profile fields (email, phone, department) are informational only and never
//! take part in authorization decisions.

use serde::Serialize;
use thiserror::Error;

use crate::db::Account;
use crate::domain::Identity;

pub const MAX_PROFILE_FIELD_LEN: usize = 100;

/// Errors specific to profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Account {0} not found")]
    NotFound(i32),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ProfileError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ProfileError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
}

impl From<Account> for Profile {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            phone: account.phone,
            department: account.department,
        }
    }
}

/// Requested profile changes. Blank strings clear a field.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
}

/// Domain service trait for profiles.
#[async_trait::async_trait]
pub trait ProfileService: Send + Sync {
    /// Reads a profile. Caller must be the account itself or an admin.
    async fn get(&self, identity: &Identity, account_id: i32) -> Result<Profile, ProfileError>;

    /// Replaces the profile fields. Caller must be the account itself or an admin.
    async fn update(
        &self,
        identity: &Identity,
        account_id: i32,
        update: ProfileUpdate,
    ) -> Result<Profile, ProfileError>;
}
