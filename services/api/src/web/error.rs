//! services/api/src/web/error.rs
//!
//! Maps controller failures onto HTTP responses with a consistent JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lifedeal_core::{ControllerError, StoreError};
use serde::Serialize;
use utoipa::ToSchema;

/// The body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    /// Field-keyed violations, present on `VALIDATION_ERROR` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub fields: Option<serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type HttpResult<T> = Result<T, HttpError>;

impl From<StoreError> for HttpError {
    fn from(err: StoreError) -> Self {
        Self::Controller(ControllerError::Store(err))
    }
}

impl HttpError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            HttpError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            HttpError::Controller(err) => match err {
                ControllerError::NotReady => (StatusCode::SERVICE_UNAVAILABLE, "NOT_READY"),
                ControllerError::Validation(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
                }
                ControllerError::DescriptionUnavailable => {
                    (StatusCode::SERVICE_UNAVAILABLE, "DESCRIPTION_UNAVAILABLE")
                }
                ControllerError::Description(_) => (StatusCode::BAD_GATEWAY, "DESCRIPTION_FAILED"),
                ControllerError::Store(store) => match store {
                    StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    StoreError::Schema(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                    }
                    StoreError::Fetch(_)
                    | StoreError::Rejected(_)
                    | StoreError::PartialBatch { .. } => {
                        (StatusCode::BAD_GATEWAY, "BACKEND_ERROR")
                    }
                },
            },
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let fields = match &self {
            HttpError::Controller(ControllerError::Validation(errors)) => {
                serde_json::to_value(errors).ok()
            }
            _ => None,
        };

        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Internal error");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorBody {
                error,
                code: code.to_string(),
                fields,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifedeal_core::RecordId;

    #[test]
    fn store_errors_map_to_gateway_or_not_found() {
        let missing = HttpError::from(StoreError::NotFound {
            entity: "Deal",
            id: RecordId::new(7),
        });
        let down = HttpError::from(StoreError::Fetch("timeout".to_string()));

        assert_eq!(missing.status_and_code().0, StatusCode::NOT_FOUND);
        assert_eq!(down.status_and_code().0, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn not_ready_is_unavailable() {
        let err = HttpError::from(ControllerError::NotReady);
        assert_eq!(err.status_and_code(), (StatusCode::SERVICE_UNAVAILABLE, "NOT_READY"));
    }
}
