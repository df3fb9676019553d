//! Request-level error type and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Catalog request failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidProgress(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("JSON error: failed to encode response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Catalog(_) | ApiError::Store(_) | ApiError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidProgress(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!("{}", message);
        } else {
            tracing::warn!("{}", message);
        }
        (status, message).into_response()
    }
}
