//! Start endpoints for ingestion, analysis and LLM maintenance jobs.

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use mvpfinder_pipeline::JobId;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct SyncRequest {
    /// Empty or absent means every active channel.
    #[serde(default)]
    channel_ids: Option<Vec<i64>>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct AnalyzeRequest {
    /// Empty or absent means the oldest unanalyzed items.
    #[serde(default)]
    item_ids: Option<Vec<i64>>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct StartedJob {
    job_id: JobId,
    status: &'static str,
    message: &'static str,
}

/// Parses an optional JSON body; an empty body yields `T::default()`.
fn parse_body<T: DeserializeOwned + Default>(request_id: &str, body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        ApiError::new(
            request_id,
            "validation_error",
            format!("invalid request body: {e}"),
        )
    })
}

fn resolve_limit(request_id: &str, limit: Option<usize>, default: usize) -> Result<usize, ApiError> {
    match limit {
        Some(0) => Err(ApiError::new(
            request_id,
            "validation_error",
            "limit must be at least 1",
        )),
        Some(limit) => Ok(limit),
        None => Ok(default),
    }
}

fn non_empty(ids: Option<Vec<i64>>) -> Option<Vec<i64>> {
    ids.filter(|ids| !ids.is_empty())
}

fn accepted(request_id: String, job_id: JobId, message: &'static str) -> impl IntoResponse {
    (
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: StartedJob {
                job_id,
                status: "processing",
                message,
            },
            meta: ResponseMeta::new(request_id),
        }),
    )
}

pub(super) async fn start_sync(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: SyncRequest = parse_body(&req_id.0, &body)?;
    let limit = resolve_limit(&req_id.0, request.limit, state.limits.sync)?;

    let job_id = state
        .jobs
        .start_ingestion(non_empty(request.channel_ids), limit)
        .await;
    tracing::info!(%job_id, limit, "sync job started");
    Ok(accepted(req_id.0, job_id, "sync started in background"))
}

pub(super) async fn start_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: AnalyzeRequest = parse_body(&req_id.0, &body)?;
    let limit = resolve_limit(&req_id.0, request.limit, state.limits.analyze)?;

    let job_id = state
        .jobs
        .start_analysis(non_empty(request.item_ids), limit)
        .await;
    tracing::info!(%job_id, limit, "analysis job started");
    Ok(accepted(req_id.0, job_id, "analysis started in background"))
}

pub(super) async fn llm_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let status = state.jobs.llm_status().await;
    Json(ApiResponse {
        data: status,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn start_model_pull(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let job_id = state.jobs.start_model_pull().await;
    accepted(req_id.0, job_id, "model download started in background")
}

pub(super) async fn start_connection_test(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let job_id = state.jobs.start_connection_test().await;
    accepted(req_id.0, job_id, "connection test started in background")
}
