use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use crate::docs::ApiDoc;
use crate::modules::job::{download, handler};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use crate::state::AppState;
use serde::Serialize;
use utoipa::ToSchema;

use tower_http::cors::{Any, CorsLayer};

pub const SERVICE_NAME: &str = "GPU Video Compressor API";

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    #[serde(rename = "podName")]
    pub pod_name: String,
}

pub fn configure_routes() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .route("/upload", post(handler::upload_video))
        .route("/status/{job_id}", get(handler::get_job_status))
        .route("/static/{file}", get(download::download_output))
        .nest("/api/v1", api_routes())
        .layer(cors)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/jobs", crate::modules::job::router())
}

/// Liveness probe, also reporting which instance answered
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        pod_name: state.config.pod_name.clone(),
    })
}
