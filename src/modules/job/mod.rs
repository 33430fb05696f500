use axum::Router;
use axum::routing::{get, post};
use crate::state::AppState;

pub mod download;
pub mod dto;
pub mod handler;
pub mod model;
pub mod registry;
pub mod service;

pub fn router() -> axum::Router<AppState> {
    Router::new()
        .route("/", post(handler::upload_video))
        .route("/{job_id}", get(handler::get_job_status))
}
