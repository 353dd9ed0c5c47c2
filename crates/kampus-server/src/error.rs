use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use kampus_shared::ValidationError;
use kampus_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests, slow down")]
    TooManyRequests,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ServerError::Internal(_) | ServerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for ServerError {
    fn from(err: ValidationError) -> Self {
        ServerError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServerError::NotFound("Record not found".into()),
            StoreError::Conflict => ServerError::BadRequest("Record already exists".into()),
            other => ServerError::Store(other),
        }
    }
}

/// Map a store miss to a 404 naming `what`; other store errors pass through.
pub fn or_not_found(what: &str) -> impl FnOnce(StoreError) -> ServerError + '_ {
    move |err| match err {
        StoreError::NotFound => ServerError::NotFound(format!("{what} not found")),
        other => other.into(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = serde_json::json!({
            "success": false,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
