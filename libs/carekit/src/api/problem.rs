//! Error bodies for every CareFlow endpoint.
//!
//! Failures are rendered as RFC 9457 documents served with
//! `application/problem+json`. Module errors carry an application `code`
//! and a `type` URI derived from it; framework failures (bad JSON, oversized
//! bodies, unknown routes) use the status' canonical reason as the title.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Prefix of the `type` member for coded problems.
pub const PROBLEM_TYPE_BASE: &str = "https://errors.careflow.local";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(title = "Problem", description = "RFC 9457 problem document")]
pub struct Problem {
    /// `about:blank` unless the problem has an application code.
    #[serde(rename = "type")]
    pub type_url: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    /// Request path the problem occurred on.
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Offending request fields, present on validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// One rejected input field, addressed by JSON Pointer (`/doctorName`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(title = "FieldError")]
pub struct FieldError {
    pub pointer: String,
    pub detail: String,
}

impl FieldError {
    pub fn at(field: &str, detail: impl Into<String>) -> Self {
        Self {
            pointer: format!("/{}", field.trim_start_matches('/')),
            detail: detail.into(),
        }
    }
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_owned(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
            instance: String::new(),
            code: String::new(),
            request_id: None,
            errors: None,
        }
    }

    /// Titled with the status' canonical reason phrase.
    pub fn for_status(status: StatusCode, detail: impl Into<String>) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or("Error"), detail)
    }

    pub fn coded(
        status: StatusCode,
        code: &str,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            type_url: format!("{PROBLEM_TYPE_BASE}/{code}"),
            code: code.to_owned(),
            ..Self::new(status, title, detail)
        }
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = uri.into();
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_field_error(mut self, error: FieldError) -> Self {
        self.errors.get_or_insert_with(Vec::new).push(error);
        self
    }
}

/// `Problem` as an axum response.
#[derive(Debug, Clone)]
pub struct ProblemResponse(pub Problem);

impl From<Problem> for ProblemResponse {
    fn from(p: Problem) -> Self {
        Self(p)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, APPLICATION_PROBLEM_JSON)],
            Json(self.0),
        )
            .into_response()
    }
}

pub fn unauthorized(detail: impl Into<String>) -> ProblemResponse {
    Problem::coded(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Unauthorized", detail).into()
}

pub fn forbidden(detail: impl Into<String>) -> ProblemResponse {
    Problem::coded(StatusCode::FORBIDDEN, "FORBIDDEN", "Forbidden", detail).into()
}

pub fn not_found(detail: impl Into<String>) -> ProblemResponse {
    Problem::for_status(StatusCode::NOT_FOUND, detail).into()
}

pub fn internal_error(detail: impl Into<String>) -> ProblemResponse {
    Problem::for_status(StatusCode::INTERNAL_SERVER_ERROR, detail).into()
}
