use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::users::{repo::StoreError, validation::ValidationErrors};

pub const GENERIC_ERROR_MESSAGE: &str =
    "Something went wrong. Please try again or contact support.";

/// Every failure a handler can return. Converting to a response is the only
/// place where errors become HTTP statuses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("user not found")]
    NotFound,
    /// Body or query string could not be decoded at all.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "User not found")]
    pub message: String,
    /// Field name to violated constraints; only on validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub errors: Option<ValidationErrors>,
}

impl ErrorBody {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => {
                let mut errors = ValidationErrors::default();
                errors.add("email", "The email has already been taken.");
                AppError::Validation(errors)
            }
            StoreError::Other(e) => AppError::Unexpected(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorBody {
                    message: "The given data was invalid.".into(),
                    errors: Some(errors),
                }),
            )
                .into_response(),
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Json(ErrorBody::message("User not found"))).into_response()
            }
            AppError::Rejected { status, message } => {
                (status, Json(ErrorBody::message(message))).into_response()
            }
            AppError::Unexpected(e) => {
                error!(error = ?e, "unexpected error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::message(GENERIC_ERROR_MESSAGE)),
                )
                    .into_response()
            }
        }
    }
}
