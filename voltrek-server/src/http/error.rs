//! Maps internal errors onto HTTP status codes, the conventional axum
//! `IntoResponse`-on-error-enum idiom (spec §7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::command::CommandError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl From<CommandError> for ServerError {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::NotFound(m) => ServerError::NotFound(m),
            CommandError::InvalidArgument(m) => ServerError::InvalidArgument(m),
            CommandError::Conflict(m) => ServerError::Conflict(m),
            CommandError::Internal(m) => ServerError::Internal(m),
        }
    }
}

impl From<voltrek_core::EngineError> for ServerError {
    fn from(e: voltrek_core::EngineError) -> Self {
        ServerError::InvalidArgument(e.to_string())
    }
}

impl From<voltrek_core::ParseDirectionError> for ServerError {
    fn from(e: voltrek_core::ParseDirectionError) -> Self {
        ServerError::InvalidArgument(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {self}");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
