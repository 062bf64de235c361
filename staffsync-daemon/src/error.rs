use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use thiserror::Error;

use staffsync_sheets::format_timestamp;
use staffsync_sync::SyncError;

/// Error surface for the daemon runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] staffsync_core::ConfigError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("{0}")]
    Task(String),
}

pub(crate) fn io_err(context: impl Into<String>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        context: context.into(),
        source,
    }
}

/// Handler failure, rendered as a JSON body.
#[derive(Debug)]
pub enum ApiError {
    /// 400 `{error}`
    BadRequest(String),
    /// 500 `{error}`
    Internal(String),
    /// 500 `{error: "Sync failed", details, timestamp}`
    SyncFailed { details: String },
}

impl From<DaemonError> for ApiError {
    fn from(err: DaemonError) -> Self {
        match err {
            DaemonError::Sync(sync) if sync.is_validation() => ApiError::BadRequest(sync.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Malformed or mistyped request bodies get the same `{error}` shape as
/// every other failure.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
            }
            ApiError::SyncFailed { details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Sync failed",
                    "details": details,
                    "timestamp": format_timestamp(Utc::now()),
                }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
