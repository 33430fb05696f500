use crate::modules::media::model::ComparisonSummary;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// Why a job ended in [`JobStatus::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    InputProbe,
    Encode,
    EncodeTimeout,
    OutputProbe,
    QueueClosed,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub original_filename: String,
    pub size: u64,
    pub input_path: PathBuf,
    /// Set once the job is complete.
    pub output_path: Option<PathBuf>,
    pub created_at: OffsetDateTime,
    pub finished_at: Option<OffsetDateTime>,
    pub failure: Option<FailureReason>,
    pub summary: Option<ComparisonSummary>,
}

impl Job {
    pub fn new(id: Uuid, original_filename: String, size: u64, input_path: PathBuf) -> Self {
        Self {
            id,
            status: JobStatus::Processing,
            original_filename,
            size,
            input_path,
            output_path: None,
            created_at: OffsetDateTime::now_utc(),
            finished_at: None,
            failure: None,
            summary: None,
        }
    }
}

/// Download locator served for a completed job.
pub fn output_file_name(id: Uuid) -> String {
    format!("{}_output.mp4", id)
}

pub fn download_url(id: Uuid) -> String {
    format!("/static/{}", output_file_name(id))
}
