use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
};
use serde::de::DeserializeOwned;

use crate::api::problem::{Problem, ProblemResponse};
use crate::http::REQUEST_ID_HEADER;

/// JSON request body whose rejections are problem documents.
///
/// Drop-in for `axum::Json` on the extractor side; responses keep using
/// `axum::Json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let instance = req.uri().path().to_owned();
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(%instance, error = %rejection, "Rejected request body");
                let mut problem = rejection_problem(&rejection).with_instance(instance);
                if let Some(id) = request_id {
                    problem = problem.with_request_id(id);
                }
                Err(problem.into())
            }
        }
    }
}

fn rejection_problem(rejection: &JsonRejection) -> Problem {
    let status = rejection.status();
    let code = match status {
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        _ => "INVALID_JSON_BODY",
    };
    let title = status.canonical_reason().unwrap_or("Bad Request");
    Problem::coded(status, code, title, rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::APPLICATION_PROBLEM_JSON;
    use axum::{body::Body, http::header, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize)]
    struct Note {
        text: String,
    }

    fn app() -> Router {
        Router::new().route(
            "/notes",
            post(|JsonBody(note): JsonBody<Note>| async move { note.text }),
        )
    }

    async fn post_body(content_type: Option<&str>, body: &'static str) -> axum::response::Response {
        let mut req = Request::builder()
            .method("POST")
            .uri("/notes")
            .header(REQUEST_ID_HEADER, "rid-7");
        if let Some(ct) = content_type {
            req = req.header(header::CONTENT_TYPE, ct);
        }
        app()
            .oneshot(req.body(Body::from(body)).unwrap())
            .await
            .unwrap()
    }

    async fn problem_of(resp: axum::response::Response) -> Problem {
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            APPLICATION_PROBLEM_JSON
        );
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn valid_body_reaches_handler() {
        let resp = post_body(Some("application/json"), r#"{"text":"hi"}"#).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn syntax_error_is_a_400_problem() {
        let resp = post_body(Some("application/json"), "not json").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let p = problem_of(resp).await;
        assert_eq!(p.code, "INVALID_JSON_BODY");
        assert_eq!(p.instance, "/notes");
        assert_eq!(p.request_id.as_deref(), Some("rid-7"));
    }

    #[tokio::test]
    async fn wrong_field_type_is_a_422_problem() {
        let resp = post_body(Some("application/json"), r#"{"text":5}"#).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let p = problem_of(resp).await;
        assert_eq!(p.title, "Unprocessable Entity");
        assert!(!p.detail.is_empty());
    }

    #[tokio::test]
    async fn missing_content_type_is_a_415_problem() {
        let resp = post_body(None, r#"{"text":"hi"}"#).await;
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(problem_of(resp).await.code, "UNSUPPORTED_MEDIA_TYPE");
    }
}
