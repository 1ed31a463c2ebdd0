//! Last-resort mapping of framework error responses to problem documents.
//!
//! Handlers already answer with `ProblemResponse`. Responses produced outside
//! them (body limit, timeout, method not allowed) arrive as plain text or
//! empty bodies; this middleware rewrites those, keeping status and headers.

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::problem::{Problem, ProblemResponse, APPLICATION_PROBLEM_JSON};
use crate::http::REQUEST_ID_HEADER;

/// Longest plain-text body reused as the problem `detail`.
const MAX_DETAIL_BYTES: usize = 1024;

pub async fn map_plain_errors(request: Request, next: Next) -> Response {
    let instance = request.uri().path().to_owned();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_problem(response.headers()) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let detail = plain_detail(body)
        .await
        .or_else(|| status.canonical_reason().map(str::to_owned))
        .unwrap_or_default();

    let mut problem = Problem::for_status(status, detail).with_instance(instance);
    if let Some(id) = request_id {
        problem = problem.with_request_id(id);
    }

    let mut mapped = ProblemResponse(problem).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            mapped.headers_mut().append(name.clone(), value.clone());
        }
    }
    mapped
}

fn is_problem(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(APPLICATION_PROBLEM_JSON))
}

async fn plain_detail(body: Body) -> Option<String> {
    let bytes = to_bytes(body, MAX_DETAIL_BYTES).await.ok()?;
    let text = String::from_utf8(bytes.to_vec()).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}
