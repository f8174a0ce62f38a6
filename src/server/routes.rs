//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the router with all routes.
///
/// Request bodies larger than `max_upload_bytes` are rejected with 413.
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/convert_pdf_to_csv/", post(handlers::convert_pdf_to_csv))
        .route("/convert_pdf_to_csv", post(handlers::convert_pdf_to_csv))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
