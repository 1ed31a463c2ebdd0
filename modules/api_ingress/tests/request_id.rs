use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use tower::util::ServiceExt; // for `oneshot`

use api_ingress::request_id::XRequestId;
use api_ingress::{ApiIngress, ApiIngressConfig};
use carekit::RestfulModule;

/// Echoes the request id the handler sees.
struct EchoModule;

impl RestfulModule for EchoModule {
    fn register_rest(&self, router: Router) -> anyhow::Result<Router> {
        Ok(router.route(
            "/echo",
            get(|Extension(XRequestId(rid)): Extension<XRequestId>| async move { rid }),
        ))
    }

    fn openapi(&self) -> utoipa::openapi::OpenApi {
        utoipa::openapi::OpenApiBuilder::new().build()
    }
}

fn app() -> Router {
    ApiIngress::new(ApiIngressConfig::default())
        .build_router(&[&EchoModule])
        .unwrap()
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn generates_request_id_when_missing() {
    let response = app()
        .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let header = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("x-request-id should be generated");
    assert!(!header.is_empty());

    // The handler saw the same id the client gets back
    assert_eq!(body_string(response).await, header);
}

#[tokio::test]
async fn preserves_incoming_request_id() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/echo")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("abc-123")
    );
    assert_eq!(body_string(response).await, "abc-123");
}

#[tokio::test]
async fn request_id_is_returned_on_unknown_routes() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/nowhere")
                .header("x-request-id", "missing-route")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("missing-route")
    );
}
