use super::model::{download_url, FailureReason, Job, JobStatus};
use crate::modules::media::model::ComparisonSummary;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    #[serde(rename = "jobID")]
    pub job_id: Uuid,
    pub message: String,
    pub filename: String,
    pub size: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobStatusResponse {
    #[serde(rename = "jobID")]
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    #[serde(rename = "downloadURL", skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ComparisonSummary>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        match job.status {
            JobStatus::Complete => Self {
                job_id: job.id,
                status: job.status,
                reason: None,
                download_url: Some(download_url(job.id)),
                metrics: job.summary,
            },
            JobStatus::Failed => Self {
                job_id: job.id,
                status: job.status,
                reason: job.failure,
                download_url: None,
                metrics: None,
            },
            JobStatus::Processing => Self {
                job_id: job.id,
                status: job.status,
                reason: None,
                download_url: None,
                metrics: None,
            },
        }
    }
}
