use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use std::sync::Arc;

use super::validation::validate_account_id;
use super::{ApiError, AppState, MessageResponse, ProfileDto, UpdateProfileRequest};
use crate::domain::Identity;
use crate::services::ProfileUpdate;

/// GET /users/profile/{id}
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    account_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ProfileDto>, ApiError> {
    let Path(account_id) = account_id?;
    let account_id = validate_account_id(account_id)?;

    let profile = state
        .profile_service()
        .get(&identity, account_id)
        .await?;

    Ok(Json(profile.into()))
}

/// PUT /users/profile/{id}
/// Blank or missing fields are cleared
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    account_id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(account_id) = account_id?;
    let account_id = validate_account_id(account_id)?;
    let Json(payload) = payload?;

    state
        .profile_service()
        .update(
            &identity,
            account_id,
            ProfileUpdate {
                email: payload.email,
                phone: payload.phone,
                department: payload.department,
            },
        )
        .await?;

    Ok(Json(MessageResponse::new("Profile updated")))
}
