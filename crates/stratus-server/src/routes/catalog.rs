//! `/catalog` endpoints: inventory listing and refresh.

use crate::error::ApiResult;
use crate::middleware::require_role;
use crate::state::{refresh_catalog, AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use stratus_auth::{AuthContext, Role};
use stratus_catalog::CatalogFilter;
use stratus_core::{CatalogEntry, Provider, Tier};
use tracing::error;
use uuid::Uuid;

const DEFAULT_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListObjectsQuery {
    pub provider: Option<Provider>,
    pub tier: Option<Tier>,
    pub limit: Option<usize>,
    pub cursor: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListObjectsResponse {
    pub objects: Vec<CatalogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<usize>,
}

pub async fn list_objects(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ListObjectsQuery>,
) -> ApiResult<Json<ListObjectsResponse>> {
    require_role(&state, &ctx, Role::Viewer)?;

    let limit = query.limit.unwrap_or(DEFAULT_PAGE).min(1000);
    let offset = query.cursor.unwrap_or(0);
    let objects = state.catalog.list(&CatalogFilter {
        provider: query.provider,
        tier: query.tier,
        limit: Some(limit),
        offset: Some(offset),
    });

    let next_cursor = (objects.len() == limit).then_some(offset + objects.len());
    Ok(Json(ListObjectsResponse {
        objects,
        next_cursor,
    }))
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub refresh_id: Uuid,
    pub providers: Vec<Provider>,
}

/// Trigger an asynchronous refresh; returns immediately with an id.
pub async fn refresh(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<(StatusCode, Json<RefreshResponse>)> {
    require_role(&state, &ctx, Role::Admin)?;

    let refresh_id = Uuid::new_v4();
    let providers = state.registry.configured();

    let task_state = state.clone();
    tokio::spawn(async move {
        if let Err(err) = refresh_catalog(&task_state).await {
            error!("background catalog refresh {} failed: {}", refresh_id, err);
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(RefreshResponse {
            refresh_id,
            providers,
        }),
    ))
}
