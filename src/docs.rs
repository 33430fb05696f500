use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::modules::job::handler::upload_video,
        crate::modules::job::handler::get_job_status,
        crate::modules::job::download::download_output,
    ),
    components(
        schemas(
            crate::routes::HealthResponse,
            crate::common::response::ErrorResponse,
            crate::modules::job::dto::UploadResponse,
            crate::modules::job::dto::JobStatusResponse,
            crate::modules::job::model::JobStatus,
            crate::modules::job::model::FailureReason,
            crate::modules::media::model::MediaProfile,
            crate::modules::media::model::ComparisonSummary,
        )
    ),
    tags(
        (name = "Jobs", description = "Upload, compression status and download"),
        (name = "Health", description = "Liveness")
    )
)]
pub struct ApiDoc;
