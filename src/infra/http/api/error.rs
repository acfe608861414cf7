use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::submissions::{Entity, SubmissionError};
use crate::domain::validation::FieldViolation;

const SOURCE: &str = "infra::http::api";

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub ok: bool,
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const STORE_ERROR: &str = "store_error";
    pub const NOT_FOUND: &str = "not_found";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldViolation>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    fields: Vec<FieldViolation>,
    /// Logged through the response report, never returned to the caller.
    detail: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            fields: Vec::new(),
            detail: None,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn validation(fields: Vec<FieldViolation>) -> Self {
        Self {
            fields,
            ..Self::new(
                StatusCode::BAD_REQUEST,
                codes::VALIDATION_FAILED,
                "Validation failed",
                None,
            )
        }
    }

    pub fn store(message: &'static str, hint: Option<String>, detail: String) -> Self {
        Self {
            detail: Some(detail),
            ..Self::new(StatusCode::BAD_GATEWAY, codes::STORE_ERROR, message, hint)
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Validation(errors) => Self::validation(errors.into_violations()),
            SubmissionError::Store { entity, source } => {
                let message = match entity {
                    Entity::Lead => "Failed to create lead",
                    Entity::Review => "Failed to create review",
                };
                Self::store(message, None, source.to_string())
            }
            SubmissionError::SchemaBinding { attempted, last } => Self::store(
                "Failed to create review",
                Some(format!(
                    "no product link field was accepted; tried {}",
                    attempted.join(", ")
                )),
                last.map(|source| source.to_string())
                    .unwrap_or_else(|| "no candidate attempted".to_string()),
            ),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("Invalid JSON body", Some(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let logged = self
            .detail
            .clone()
            .or_else(|| self.hint.clone())
            .unwrap_or_else(|| {
                self.fields
                    .iter()
                    .map(|v| format!("{} {}", v.field, v.message))
                    .collect::<Vec<_>>()
                    .join("; ")
            });
        let body = ApiErrorBody {
            ok: false,
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
                fields: self.fields,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(SOURCE, self.status, format!("{}: {}", self.code, logged))
            .attach(&mut response);
        response
    }
}
