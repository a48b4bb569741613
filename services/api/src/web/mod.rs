pub mod rest;
pub mod scan_task;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::web::state::AppState;

// Re-export the handlers so the binary and tests can reach them directly.
pub use rest::{
    add_to_collection_handler, clear_history_handler, get_library_plant_handler,
    get_state_handler, list_collection_handler, list_history_handler, list_library_handler,
    navigate_handler, remove_from_collection_handler, reset_handler, scan_handler,
    select_record_handler,
};

/// Maximum accepted request body, sized for phone photos.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Builds the API router over the shared state.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/scan", post(scan_handler))
        .route("/state", get(get_state_handler))
        .route("/view", post(navigate_handler))
        .route("/view/reset", post(reset_handler))
        .route("/records/{id}/select", post(select_record_handler))
        .route(
            "/history",
            get(list_history_handler).delete(clear_history_handler),
        )
        .route(
            "/collection",
            get(list_collection_handler).post(add_to_collection_handler),
        )
        .route("/collection/{id}", delete(remove_from_collection_handler))
        .route("/library", get(list_library_handler))
        .route("/library/{id}", get(get_library_plant_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(app_state)
}
