use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use crate::common::error::AppError;
use crate::state::AppState;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Headroom for multipart boundaries and part headers on top of the file ceiling.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

pub fn create_app(state: AppState) -> Router {
    let body_limit = (state.config.max_upload_bytes + MULTIPART_OVERHEAD) as usize;

    crate::routes::configure_routes()
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::map_response_with_state(
            state.clone(),
            body_limit_as_client_error,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The body limit layer answers with a bare 413; clients get the JSON envelope instead.
async fn body_limit_as_client_error(State(state): State<AppState>, response: Response) -> Response {
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::file_too_large(&state.config).into_response();
    }
    response
}
