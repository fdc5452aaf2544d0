use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    #[error("No data provided")]
    EmptyData,
    #[error("malformed request body: {source}")]
    MalformedPayload {
        #[from]
        source: JsonRejection,
    },
    #[error("Paste not found or deleted")]
    NotFound,
    #[error("no free key after {attempts} attempts")]
    KeySpaceExhausted { attempts: u32 },
    #[error("database error")]
    Database { source: sqlx::Error },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::EmptyData => StatusCode::BAD_REQUEST,
            ApiError::MalformedPayload { source } => match source.status() {
                StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            },
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::KeySpaceExhausted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = if status_code.is_server_error() {
            match &self {
                ApiError::Database { source } => error!("{self}: {source}"),
                _ => error!("{self}"),
            }
            "internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(source: sqlx::Error) -> Self {
        match source {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            _ => ApiError::Database { source },
        }
    }
}
