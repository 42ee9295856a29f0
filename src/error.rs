use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::{form::FormErrors, models::ValidationFailedResponse, store::StoreError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(#[from] FormErrors),
    #[error("invalid request body: {0}")]
    Request(#[from] JsonRejection),
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: &'static str,
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    kind: &'static str,
    correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationFailedResponse {
                    message: "Validation failed",
                    errors,
                }),
            )
                .into_response(),
            Self::Request(rejection) => {
                let correlation_id = Uuid::new_v4().to_string();
                debug!(%correlation_id, status = %rejection.status(), "request body rejected");

                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody {
                        message: "Invalid request body",
                        error: ErrorDetail {
                            kind: "request",
                            correlation_id,
                            detail: Some(rejection.body_text()),
                        },
                    }),
                )
                    .into_response()
            }
            // The client only gets a correlation id; the cause stays in the log.
            Self::Storage(err) => {
                let correlation_id = Uuid::new_v4().to_string();
                error!(%correlation_id, error = %err, "failed to save registration");

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        message: "Error saving details",
                        error: ErrorDetail {
                            kind: "storage",
                            correlation_id,
                            detail: None,
                        },
                    }),
                )
                    .into_response()
            }
        }
    }
}
