//! Bulk job routes: submission, listing, and status polling.

use axum::extract::{Extension, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::domains::credits::Shop;
use crate::domains::jobs::{
    admission, map_bulk_job, map_bulk_jobs, BulkJob, BulkJobView, CreateJobRequest,
};
use crate::server::app::AppState;
use crate::server::error::ApiError;

use super::require_shop_domain;

const RECENT_JOBS_LIMIT: i64 = 25;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub job_id: Uuid,
}

#[derive(Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<BulkJobView>,
    pub credits: i64,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub job: BulkJobView,
}

/// `POST /api/jobs` - admit a bulk generation request.
pub async fn create_job_handler(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<CreateJobResponse>), ApiError> {
    let shop_domain = require_shop_domain(&headers)?;
    let job_id = admission::submit_job(&state.deps, &shop_domain, body).await?;
    Ok((StatusCode::CREATED, Json(CreateJobResponse { job_id })))
}

/// `GET /api/jobs` - recent jobs plus the current credit balance.
pub async fn list_jobs_handler(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> Result<Json<JobListResponse>, ApiError> {
    let shop_domain = require_shop_domain(&headers)?;

    let jobs = BulkJob::list_for_shop(&state.deps.db_pool, &shop_domain, RECENT_JOBS_LIMIT)
        .await
        .map_err(ApiError::Internal)?;
    let shop = Shop::get_or_create(
        &state.deps.db_pool,
        &shop_domain,
        state.deps.initial_shop_credits,
    )
    .await
    .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(Json(JobListResponse {
        jobs: map_bulk_jobs(&jobs),
        credits: shop.credits_balance,
    }))
}

/// `GET /api/jobs/:job_id` - one job, scoped to the calling shop.
pub async fn get_job_handler(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResponse>, ApiError> {
    let shop_domain = require_shop_domain(&headers)?;

    let job = BulkJob::find_for_shop(&state.deps.db_pool, &shop_domain, job_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Job not found.".to_string()))?;

    Ok(Json(JobResponse {
        job: map_bulk_job(&job),
    }))
}
