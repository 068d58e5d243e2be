//! `/migrations` endpoints: create, list, inspect, cancel.

use crate::error::{ApiError, ApiResult};
use crate::middleware::require_role;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use stratus_auth::{AuthContext, Role};
use stratus_core::{CoreError, Provider};
use stratus_engine::{
    CreateJobRequest, FileCounts, JobId, JobPriority, JobStatus, MigrationJob,
};

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: JobId,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<CreateJobRequest>,
) -> ApiResult<(StatusCode, Json<CreateJobResponse>)> {
    require_role(&state, &ctx, Role::User)?;

    let job_id = state.engine.create_job(&ctx.principal_id, req).await?;
    Ok((StatusCode::CREATED, Json(CreateJobResponse { job_id })))
}

/// Job listing row: everything but the per-file detail.
#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub owner: String,
    pub source_provider: Provider,
    pub source_container: String,
    pub dest_provider: Provider,
    pub dest_container: String,
    pub priority: JobPriority,
    pub status: JobStatus,
    pub progress_percentage: u8,
    pub counts: FileCounts,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&MigrationJob> for JobSummary {
    fn from(job: &MigrationJob) -> Self {
        Self {
            job_id: job.id,
            owner: job.owner.clone(),
            source_provider: job.source_provider,
            source_container: job.source_container.clone(),
            dest_provider: job.dest_provider,
            dest_container: job.dest_container.clone(),
            priority: job.priority,
            status: job.status,
            progress_percentage: job.progress_percentage,
            counts: job.counts(),
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

/// Jobs visible to the caller: admins see all, others their own.
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<JobSummary>>> {
    require_role(&state, &ctx, Role::Viewer)?;

    let owner_filter = if ctx.is_admin() {
        None
    } else {
        Some(ctx.principal_id.as_str())
    };
    let jobs = state.engine.list_jobs(owner_filter).await;
    Ok(Json(jobs.iter().map(JobSummary::from).collect()))
}

fn parse_job_id(raw: &str) -> ApiResult<JobId> {
    raw.parse::<JobId>().map_err(ApiError::from)
}

/// Fetch a job the caller may see; hidden jobs read as absent.
async fn visible_job(state: &AppState, ctx: &AuthContext, id: JobId) -> ApiResult<MigrationJob> {
    let job = state
        .engine
        .get_job(id)
        .await
        .ok_or_else(|| ApiError(CoreError::not_found(format!("job {}", id))))?;
    if !ctx.is_admin() && job.owner != ctx.principal_id {
        return Err(ApiError(CoreError::not_found(format!("job {}", id))));
    }
    Ok(job)
}

/// Full job detail, per-file status included.
pub async fn get(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MigrationJob>> {
    require_role(&state, &ctx, Role::Viewer)?;
    let job = visible_job(&state, &ctx, parse_job_id(&id)?).await?;
    Ok(Json(job))
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub job_id: JobId,
    pub status: JobStatus,
}

/// Cancel a job: owner or admin only.
pub async fn cancel(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<CancelResponse>> {
    require_role(&state, &ctx, Role::User)?;
    let job_id = parse_job_id(&id)?;
    visible_job(&state, &ctx, job_id).await?;

    let status = state.engine.cancel_job(job_id).await?;
    Ok(Json(CancelResponse { job_id, status }))
}
