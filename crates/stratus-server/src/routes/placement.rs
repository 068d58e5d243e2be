//! `/placement` endpoints: recommendations and tier distribution.

use crate::error::ApiResult;
use crate::middleware::require_role;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use stratus_auth::{AuthContext, Role};
use stratus_catalog::CatalogFilter;
use stratus_core::{Provider, Recommendation, Tier};

#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    pub provider: Option<Provider>,
    pub tier: Option<Tier>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationRow {
    pub provider: Provider,
    pub container: String,
    pub key: String,
    pub size_bytes: u64,
    pub current_tier: Tier,
    #[serde(flatten)]
    pub recommendation: Recommendation,
}

pub async fn recommendations(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<RecommendationsQuery>,
) -> ApiResult<Json<Vec<RecommendationRow>>> {
    require_role(&state, &ctx, Role::Viewer)?;

    let entries = state.catalog.recommendations(&CatalogFilter {
        provider: query.provider,
        tier: query.tier,
        limit: None,
        offset: None,
    });

    let rows: Vec<RecommendationRow> = entries
        .into_iter()
        .filter_map(|entry| {
            let recommendation = entry.recommendation?;
            Some(RecommendationRow {
                provider: entry.object.provider,
                container: entry.object.container,
                key: entry.object.key,
                size_bytes: entry.object.size_bytes,
                current_tier: entry.current_tier,
                recommendation,
            })
        })
        .take(query.limit.unwrap_or(usize::MAX))
        .collect();

    Ok(Json(rows))
}

#[derive(Debug, Serialize)]
pub struct TierDistributionRow {
    pub provider: Provider,
    pub tier: Tier,
    pub object_count: usize,
    pub total_bytes: u64,
    pub monthly_cost: f64,
}

pub async fn tier_distribution(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TierDistributionRow>>> {
    require_role(&state, &ctx, Role::Viewer)?;

    let cost = state.classifier.cost_model();
    let rows = state
        .catalog
        .tier_distribution()
        .into_iter()
        .map(|bucket| TierDistributionRow {
            monthly_cost: cost.monthly_cost(bucket.provider, bucket.tier, bucket.total_bytes),
            provider: bucket.provider,
            tier: bucket.tier,
            object_count: bucket.object_count,
            total_bytes: bucket.total_bytes,
        })
        .collect();

    Ok(Json(rows))
}
