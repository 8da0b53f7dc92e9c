use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use sidetree_core::RequestHandler;
use sidetree_types::DidDocument;

use crate::error::ApiError;

pub type AppState = Arc<RequestHandler>;

/// Submit an encoded operation. A create answers with the new DID document.
pub async fn operations_handler(
    State(handler): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    Ok(match handler.handle_operation_request(&body).await? {
        Some(document) => Json(document).into_response(),
        None => StatusCode::OK.into_response(),
    })
}

pub async fn resolve_handler(
    State(handler): State<AppState>,
    Path(did): Path<String>,
) -> Result<Json<DidDocument>, ApiError> {
    Ok(Json(handler.handle_resolve_request(&did).await?))
}

/// Reports 503 until the core is ready.
pub async fn health_handler(State(handler): State<AppState>) -> Response {
    let ready = handler.is_ready();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = json!({
        "status": if ready { "ready" } else { "starting" },
        "version": env!("CARGO_PKG_VERSION"),
    });
    (status, Json(body)).into_response()
}
