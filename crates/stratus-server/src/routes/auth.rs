//! `/auth` endpoints: principal registration and login.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use stratus_auth::{BearerToken, Role};
use stratus_core::CoreError;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 64))]
    pub principal_id: String,

    #[validate(length(min = 8, max = 128))]
    pub credential: String,

    /// Requested role; defaults to viewer. Admin can only be claimed while
    /// the principal store is empty (first-boot bootstrap).
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub principal_id: String,
    pub role: Role,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()
        .map_err(|err| ApiError(CoreError::invalid_argument(err.to_string())))?;

    let requested = req.role.unwrap_or(Role::Viewer);
    if requested == Role::Admin && !state.auth.is_empty().await? {
        return Err(ApiError(CoreError::forbidden(
            "admin registration is only available on an empty principal store",
        )));
    }

    let principal = state
        .auth
        .register(&req.principal_id, &req.credential, requested)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            principal_id: principal.id,
            role: principal.role,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub principal_id: String,
    pub credential: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<BearerToken>> {
    let bearer = state.auth.login(&req.principal_id, &req.credential).await?;
    Ok(Json(bearer))
}
