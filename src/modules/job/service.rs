use super::dto::{JobStatusResponse, UploadResponse};
use super::model::{FailureReason, Job};
use crate::common::error::AppError;
use crate::common::upload::{stream_to_disk, UploadError};
use crate::infrastructure::queue::transcode::{QueueError, QueueSlot};
use crate::state::AppState;
use axum::extract::multipart::Field;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct JobService;

impl JobService {
    /// Claims room in the transcode queue before any bytes are accepted.
    pub fn reserve_slot(state: &AppState) -> Result<QueueSlot, AppError> {
        state.queue.reserve().map_err(|e| match e {
            QueueError::Saturated => AppError::QueueSaturated,
            QueueError::Closed => AppError::ShuttingDown,
        })
    }

    /// Persists the uploaded file, registers the job and queues it for
    /// transcoding. Returns as soon as the job is queued.
    pub async fn create_job(
        state: &AppState,
        slot: QueueSlot,
        field: Field<'_>,
    ) -> Result<UploadResponse, AppError> {
        let filename = field.file_name().unwrap_or_default().to_string();
        let job_id = Uuid::new_v4();
        let input_path = state.storage.input_path(job_id, &filename);

        let size = stream_to_disk(field, &input_path, state.config.max_upload_bytes)
            .await
            .map_err(|e| match e {
                UploadError::TooLarge { .. } => AppError::file_too_large(&state.config),
                UploadError::Stream(detail) => {
                    AppError::ClientInput(format!("Upload stream interrupted: {}", detail))
                }
                UploadError::Io(e) => AppError::Persistence(e),
            })?;

        info!(
            job_id = %job_id,
            filename = %filename,
            "File uploaded ({:.2} MB)",
            size as f64 / (1024.0 * 1024.0)
        );

        Self::enqueue(
            state,
            slot,
            Job::new(job_id, filename.clone(), size, input_path),
        )?;

        Ok(UploadResponse {
            job_id,
            message: "File uploaded successfully. Compression started.".to_string(),
            filename,
            size,
        })
    }

    /// Registers a persisted job and hands it to the workers. A job whose
    /// task cannot be queued is failed with [`FailureReason::QueueClosed`].
    pub fn enqueue(state: &AppState, slot: QueueSlot, job: Job) -> Result<(), AppError> {
        let job_id = job.id;
        let input_path = job.input_path.clone();
        state
            .registry
            .register(job)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if let Err(e) = slot.submit(job_id, input_path, state.storage.output_path(job_id)) {
            error!(job_id = %job_id, "Failed to queue transcode task: {}", e);
            if let Err(e) = state.registry.fail(job_id, FailureReason::QueueClosed) {
                warn!(job_id = %job_id, "Could not record failure: {}", e);
            }
            return Err(AppError::ShuttingDown);
        }

        Ok(())
    }

    pub fn job_status(state: &AppState, job_id: &str) -> Result<JobStatusResponse, AppError> {
        let not_found = || AppError::NotFound("Job ID not found".to_string());

        let id = Uuid::parse_str(job_id).map_err(|_| not_found())?;
        let job = state.registry.get(id).ok_or_else(not_found)?;

        Ok(JobStatusResponse::from(job))
    }
}
