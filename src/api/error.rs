use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::api_connection::ApiConnectionError;
use crate::llm::{LlmError, ResponseFormatError};
use crate::recipes::MalformedRecipeError;
use crate::storage::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    AlreadyExists,
    InvalidInput,
    MalformedRecipe,
    ResponseFormat,
    ExternalService,
    Storage,
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyExists => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::ResponseFormat | ErrorCode::ExternalService => StatusCode::BAD_GATEWAY,
            ErrorCode::MalformedRecipe | ErrorCode::Storage | ErrorCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Errors as seen by API clients.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("stored recipe is malformed: {0}")]
    MalformedRecipe(#[from] MalformedRecipeError),
    #[error("unexpected model response: {0}")]
    ResponseFormat(#[from] ResponseFormatError),
    #[error("language model request failed: {0}")]
    ExternalService(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        AppError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::AlreadyExists { .. } => ErrorCode::AlreadyExists,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::MalformedRecipe(_) => ErrorCode::MalformedRecipe,
            AppError::ResponseFormat(_) => ErrorCode::ResponseFormat,
            AppError::ExternalService(_) => ErrorCode::ExternalService,
            AppError::Storage(_) => ErrorCode::Storage,
            AppError::Internal(_) => ErrorCode::Internal,
        }
    }
}

/// Store errors raised while validating client input (adds and updates).
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists { kind, name } => AppError::AlreadyExists { kind, name },
            StoreError::Malformed(inner) => AppError::InvalidInput(inner.to_string()),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Request bodies that are not valid JSON, or not the expected shape.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::ResponseFormat(inner) => AppError::ResponseFormat(inner),
            LlmError::Connection(ApiConnectionError::MissingApiKey(var)) => {
                AppError::ExternalService(format!("no API key configured ({} is unset)", var))
            }
            other => AppError::ExternalService(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let status = code.status();
        if status.is_server_error() {
            error!(?code, error = %self, "request failed");
        } else {
            warn!(?code, error = %self, "request rejected");
        }

        let mut body = json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        });
        if let AppError::ResponseFormat(inner) = &self {
            body["error"]["details"] = json!({ "raw_response": inner.raw() });
        }
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::not_found("recipe", "x").code().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(StoreError::AlreadyExists { kind: "user", name: "bob".into() })
                .code()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(StoreError::Malformed(MalformedRecipeError::BlankName)).code(),
            ErrorCode::InvalidInput
        );
        assert_eq!(
            AppError::from(MalformedRecipeError::BlankName).code().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_api_key_maps_to_external_service() {
        let err = AppError::from(LlmError::Connection(ApiConnectionError::MissingApiKey("KEY".into())));
        assert_eq!(err.code().status(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("KEY is unset"));
    }
}
