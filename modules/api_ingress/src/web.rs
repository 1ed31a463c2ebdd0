use axum::{
    http::{HeaderMap, Uri},
    response::{Html, Json},
};
use carekit::api::problem::{self, ProblemResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
    /// Always "ok" while the process serves requests
    pub status: String,
    /// RFC 3339 server time
    pub timestamp: String,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Server is up", body = Health))
)]
pub async fn health_check() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Problem response for unmatched routes.
pub async fn not_found(uri: Uri, headers: HeaderMap) -> ProblemResponse {
    let mut p = problem::not_found(format!("No route for {}", uri.path()));
    p.0 = p.0.with_instance(uri.path());
    if let Some(rid) = headers
        .get(crate::request_id::header())
        .and_then(|v| v.to_str().ok())
    {
        p.0 = p.0.with_request_id(rid);
    }
    p
}

pub async fn serve_docs() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8"/>
  <title>CareFlow API</title>
  <script src="https://unpkg.com/@stoplight/elements@latest/web-components.min.js"></script>
  <link rel="stylesheet" href="https://unpkg.com/@stoplight/elements@latest/styles.min.css">
</head>
<body>
  <elements-api apiDescriptionUrl="/openapi.json" router="hash" layout="sidebar"></elements-api>
</body>
</html>"#,
    )
}
