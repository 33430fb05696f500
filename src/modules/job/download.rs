use super::model::{output_file_name, JobStatus};
use crate::common::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

/// Stream a compressed output
/// Only files of completed jobs are served
#[utoipa::path(
    get,
    path = "/static/{file}",
    params(
        ("file" = String, Path, description = "`{jobID}_output.mp4` as returned in downloadURL")
    ),
    responses(
        (status = 200, description = "Compressed video (video/mp4)"),
        (status = 404, description = "Not Found")
    ),
    tag = "Jobs"
)]
pub async fn download_output(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Response {
    match open_output(&state, &file).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn open_output(state: &AppState, file: &str) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound("File not found".to_string());

    // Only the exact locator handed out by the status endpoint is accepted.
    let job_id = file
        .strip_suffix("_output.mp4")
        .and_then(|id| Uuid::parse_str(id).ok())
        .filter(|id| output_file_name(*id) == file)
        .ok_or_else(not_found)?;

    if state.registry.status(job_id).ok() != Some(JobStatus::Complete) {
        return Err(not_found());
    }

    let path = state.storage.output_path(job_id);
    let handle = tokio::fs::File::open(&path).await.map_err(|e| {
        tracing::error!(job_id = %job_id, path = %path.display(), "Failed to open output: {}", e);
        not_found()
    })?;
    let length = handle
        .metadata()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .len();

    let body = Body::from_stream(ReaderStream::new(handle));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::CONTENT_LENGTH, length)
        .body(body)
        .map_err(|e| AppError::Internal(e.to_string()))
}
