use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use pesca_core::{QueryError, ValidationError};
use pesca_warehouse::WarehouseError;

/// Process-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl ServerError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::Serialization(_) => 2,
            Self::Warehouse(_) | Self::Io(_) => 10,
        }
    }
}

/// Request-level error mapped to an HTTP response.
///
/// Malformed request input is the caller's fault (400); store and
/// normalization failures are ours (500). Empty results are not errors and
/// never reach this type.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("query worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Query(_) | Self::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
