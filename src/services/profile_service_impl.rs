//! `SeaORM` implementation of the `ProfileService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{ProfileFields, Store};
use crate::domain::Identity;
use crate::services::profile_service::{
    MAX_PROFILE_FIELD_LEN, Profile, ProfileError, ProfileService, ProfileUpdate,
};

pub struct SeaOrmProfileService {
    store: Store,
}

impl SeaOrmProfileService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn authorize(identity: &Identity, account_id: i32) -> Result<(), ProfileError> {
    if identity.can_access_account(account_id) {
        Ok(())
    } else {
        Err(ProfileError::Forbidden(
            "Cannot access another account's profile".to_string(),
        ))
    }
}

fn optional_field(name: &str, value: Option<String>) -> Result<Option<String>, ProfileError> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if value.chars().count() > MAX_PROFILE_FIELD_LEN {
        return Err(ProfileError::Validation(format!(
            "{name} must be {MAX_PROFILE_FIELD_LEN} characters or less"
        )));
    }

    Ok(Some(value))
}

fn validate(update: ProfileUpdate) -> Result<ProfileFields, ProfileError> {
    let email = optional_field("Email", update.email)?;
    if let Some(email) = &email
        && !email.contains('@')
    {
        return Err(ProfileError::Validation(format!(
            "Invalid email address: {email}"
        )));
    }

    Ok(ProfileFields {
        email,
        phone: optional_field("Phone", update.phone)?,
        department: optional_field("Department", update.department)?,
    })
}

#[async_trait]
impl ProfileService for SeaOrmProfileService {
    async fn get(&self, identity: &Identity, account_id: i32) -> Result<Profile, ProfileError> {
        authorize(identity, account_id)?;

        self.store
            .get_account(account_id)
            .await?
            .map(Profile::from)
            .ok_or(ProfileError::NotFound(account_id))
    }

    async fn update(
        &self,
        identity: &Identity,
        account_id: i32,
        update: ProfileUpdate,
    ) -> Result<Profile, ProfileError> {
        authorize(identity, account_id)?;
        let fields = validate(update)?;

        let account = self
            .store
            .update_account_profile(account_id, fields)
            .await?
            .ok_or(ProfileError::NotFound(account_id))?;

        info!(account_id, by = %identity.username, "Profile updated");
        Ok(account.into())
    }
}
