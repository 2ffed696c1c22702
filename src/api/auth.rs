use axum::{
    Json,
    extract::{Request, State, rejection::JsonRejection},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, AppState, LoginRequest, LoginResponse};
use crate::domain::Role;
use crate::services::AuthError;

// ============================================================================
// Middleware
// ============================================================================

/// Access guard for protected routes.
///
/// Verifies `Authorization: Bearer <token>` and stores the resulting
/// [`Identity`](crate::domain::Identity) in the request extensions for the
/// handler. Nothing is cached across requests.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let identity = state.shared.guard.authorize(header).inspect_err(|e| {
        tracing::debug!("Access guard rejected request: {e}");
    })?;

    tracing::Span::current().record("user_id", identity.account_id);
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Verify username, password and role; returns a session token on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;

    // An unknown role cannot match any account.
    let role: Role = payload
        .role
        .parse()
        .map_err(|_| ApiError::from(AuthError::InvalidCredentials))?;

    let result = state
        .shared
        .auth_service
        .authenticate(&payload.username, &payload.password, role)
        .await?;

    Ok(Json(result.into()))
}
