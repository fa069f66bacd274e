use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use super::{handlers, jobs, uploads};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Leave headroom for multipart framing on top of the payload limit
    let max_body_bytes = state.config().server.max_upload_bytes + 1024 * 1024;
    let uploads_dir = state.config().storage.uploads_dir.clone();

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Pipeline
        .route("/upload", post(uploads::upload_image))
        .route("/generate", post(jobs::generate_video))
        .route("/status/{job_id}", get(jobs::job_status))
        .route("/jobs", get(jobs::list_jobs))
        .route("/download/{job_id}", get(jobs::download_video))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/static/uploads", ServeDir::new(uploads_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
