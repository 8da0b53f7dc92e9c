use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router over a request handler.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/operations", post(handler::operations_handler))
        .route("/v1/identifiers/:did", get(handler::resolve_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
