use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

pub(super) async fn get_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = Uuid::parse_str(&id).map_err(|_| {
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            format!("invalid job id '{id}'"),
        )
    })?;

    let record = state.jobs.job(job_id).await.ok_or_else(|| {
        ApiError::new(
            req_id.0.clone(),
            "not_found",
            format!("job {job_id} not found"),
        )
    })?;

    Ok(Json(ApiResponse {
        data: record,
        meta: ResponseMeta::new(req_id.0),
    }))
}
