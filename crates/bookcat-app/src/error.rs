use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::json;
use tracing::error;

pub type Error = anyhow::Error;
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Missing or invalid token")]
    Unauthorized,

    #[error("Insufficient role")]
    Forbidden,

    #[error("Internal server error")]
    Internal,

    #[error("Storage failure")]
    Storage(#[source] bookcat_dal::Error),
}

impl From<bookcat_dal::Error> for ApiError {
    fn from(value: bookcat_dal::Error) -> Self {
        match value {
            bookcat_dal::Error::RecordNotFound(what) => ApiError::NotFound(what),
            other => ApiError::Storage(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // storage details stay in the log, never in the response body
        let message = match &self {
            ApiError::Storage(e) => {
                error!("Storage failure: {e}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
