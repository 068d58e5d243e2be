//! Bearer authentication middleware.
//!
//! Validates the `Authorization: Bearer <token>` header and injects the
//! resulting [`AuthContext`] into request extensions. Role checks happen per
//! handler via [`require_role`].

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use stratus_auth::{AuthContext, Role};
use stratus_core::CoreError;

/// Reject requests without a valid bearer token.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError(CoreError::unauthenticated("missing bearer token")))?;

    let ctx = state.auth.validate(token)?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

/// Gate a handler on a minimum role.
pub fn require_role(state: &AppState, ctx: &AuthContext, required: Role) -> ApiResult<()> {
    state.auth.require(ctx, required)?;
    Ok(())
}
