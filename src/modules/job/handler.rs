use super::dto::{JobStatusResponse, UploadResponse};
use super::service::JobService;
use crate::common::error::AppError;
use crate::common::response::{ApiSuccess, ErrorResponse};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

/// Multipart field carrying the media file.
pub const VIDEO_FIELD: &str = "video";

/// Upload a video for GPU compression
/// The file is stored, a job is queued, and the job id is returned right away
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload accepted, compression started", body = UploadResponse),
        (status = 400, description = "No file provided or file too large", body = ErrorResponse),
        (status = 500, description = "Failed to save file", body = ErrorResponse),
        (status = 503, description = "All transcode slots are taken", body = ErrorResponse)
    ),
    tag = "Jobs"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let slot = match JobService::reserve_slot(&state) {
        Ok(slot) => slot,
        Err(e) => return e.into_response(),
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return AppError::file_too_large(&state.config).into_response();
            }
            Err(e) => {
                return AppError::ClientInput(format!("Invalid multipart body: {}", e))
                    .into_response();
            }
        };

        if field.name() == Some(VIDEO_FIELD) {
            return match JobService::create_job(&state, slot, field).await {
                Ok(res) => ApiSuccess(res, StatusCode::OK).into_response(),
                Err(e) => e.into_response(),
            };
        }
    }

    AppError::ClientInput("No file provided".to_string()).into_response()
}

#[utoipa::path(
    get,
    path = "/status/{job_id}",
    params(
        ("job_id" = String, Path, description = "Job ID returned by the upload")
    ),
    responses(
        (status = 200, description = "Current job state", body = JobStatusResponse),
        (status = 404, description = "Job ID not found", body = ErrorResponse)
    ),
    tag = "Jobs"
)]
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    match JobService::job_status(&state, &job_id) {
        Ok(res) => ApiSuccess(res, StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}
