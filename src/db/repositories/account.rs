use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tokio::task;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::Role;
use crate::entities::{accounts, prelude::*};

/// Account data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<accounts::Model> for Account {
    type Error = anyhow::Error;

    fn try_from(model: accounts::Model) -> Result<Self> {
        let role = model
            .role
            .parse()
            .with_context(|| format!("Account {} has an invalid role", model.id))?;

        Ok(Self {
            id: model.id,
            username: model.username,
            role,
            email: model.email,
            phone: model.phone,
            department: model.department,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Optional profile fields. `None` clears the column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFields {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get account by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<Account>> {
        let account = Accounts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        account.map(Account::try_from).transpose()
    }

    /// Get account and its password hash by the (username, role) login key
    pub async fn get_credentials(
        &self,
        username: &str,
        role: Role,
    ) -> Result<Option<(Account, String)>> {
        let account = Accounts::find()
            .filter(accounts::Column::Username.eq(username))
            .filter(accounts::Column::Role.eq(role.as_str()))
            .one(&self.conn)
            .await
            .context("Failed to query account by username and role")?;

        account
            .map(|a| {
                let password_hash = a.password_hash.clone();
                Account::try_from(a).map(|account| (account, password_hash))
            })
            .transpose()
    }

    pub async fn list_all(&self) -> Result<Vec<Account>> {
        let rows = Accounts::find()
            .order_by_asc(accounts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list accounts")?;

        rows.into_iter().map(Account::try_from).collect()
    }

    /// Create an account, hashing the password with the configured Argon2 params.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        role: Role,
        config: &SecurityConfig,
    ) -> Result<Account> {
        let password = password.to_string();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let now = crate::db::now_timestamp();
        let active = accounts::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            role: Set(role.as_str().to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .with_context(|| format!("Failed to create account '{username}' ({role})"))?;

        info!("Created {} account: {}", role, username);
        Account::try_from(model)
    }

    /// Replace the profile fields of an account. Returns `None` if it does not exist.
    pub async fn update_profile(&self, id: i32, fields: ProfileFields) -> Result<Option<Account>> {
        let txn = self.conn.begin().await?;

        let Some(model) = Accounts::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let now = crate::db::now_timestamp().max(model.updated_at.clone());

        let mut active: accounts::ActiveModel = model.into();
        active.email = Set(fields.email);
        active.phone = Set(fields.phone);
        active.department = Set(fields.department);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Account::try_from(updated).map(Some)
    }
}

fn argon2_for(config: &SecurityConfig) -> Result<Argon2<'static>> {
    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password using Argon2id with a random salt.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2_for(config)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash.
///
/// The parameters embedded in the hash are used, so hashes created under
/// older settings still verify. Comparison is constant-time.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
