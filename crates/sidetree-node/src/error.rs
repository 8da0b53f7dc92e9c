use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use sidetree_core::{CoreError, HandlerError};
use sidetree_types::ProtocolError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid node config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid bind address `{0}`")]
    BindAddress(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

pub type NodeResult<T> = Result<T, NodeError>;

/// A request-handler error rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub HandlerError);

impl From<HandlerError> for ApiError {
    fn from(e: HandlerError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            HandlerError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::NotFound(_) => StatusCode::NOT_FOUND,
            HandlerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
