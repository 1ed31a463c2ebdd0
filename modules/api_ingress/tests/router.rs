use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    routing::post,
    Router,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::util::ServiceExt;
use utoipa::OpenApi;

use api_ingress::{ApiIngress, ApiIngressConfig};
use carekit::RestfulModule;

#[utoipa::path(post, path = "/api/notes", responses((status = 200, description = "Stored")))]
async fn create_note(body: String) -> String {
    body
}

#[derive(OpenApi)]
#[openapi(paths(create_note))]
struct NotesApiDoc;

struct NotesModule;

impl RestfulModule for NotesModule {
    fn register_rest(&self, router: Router) -> anyhow::Result<Router> {
        Ok(router.route("/api/notes", post(create_note)))
    }

    fn openapi(&self) -> utoipa::openapi::OpenApi {
        NotesApiDoc::openapi()
    }
}

fn router_with(config: ApiIngressConfig) -> Router {
    ApiIngress::new(config).build_router(&[&NotesModule]).unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let resp = router_with(ApiIngressConfig::default())
        .oneshot(get("/health"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["status"], "ok");
    let ts = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
}

#[tokio::test]
async fn module_routes_are_mounted() {
    let resp = router_with(ApiIngressConfig::default())
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/notes")
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_is_problem_json() {
    let resp = router_with(ApiIngressConfig::default())
        .oneshot(get("/api/unknown"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        carekit::api::APPLICATION_PROBLEM_JSON
    );
    let body = json_body(resp).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["instance"], "/api/unknown");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let config = ApiIngressConfig {
        body_limit_bytes: 16,
        ..ApiIngressConfig::default()
    };
    let resp = router_with(config)
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/notes")
                .header(header::CONTENT_LENGTH, "64")
                .body(Body::from("x".repeat(64)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        carekit::api::APPLICATION_PROBLEM_JSON
    );
    let request_id = resp
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = json_body(resp).await;
    assert_eq!(body["status"], 413);
    assert_eq!(body["instance"], "/api/notes");
    assert_eq!(body["request_id"].as_str(), request_id.as_deref());
}

#[tokio::test]
async fn wrong_method_is_a_problem() {
    let resp = router_with(ApiIngressConfig::default())
        .oneshot(get("/api/notes"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        carekit::api::APPLICATION_PROBLEM_JSON
    );
    assert_eq!(json_body(resp).await["title"], "Method Not Allowed");
}

#[tokio::test]
async fn docs_are_hidden_by_default() {
    let app = router_with(ApiIngressConfig::default());
    let resp = app.clone().oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = app.oneshot(get("/docs")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn docs_publish_merged_openapi() {
    let app = router_with(ApiIngressConfig {
        enable_docs: true,
        ..ApiIngressConfig::default()
    });

    let resp = app.clone().oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
    let doc = json_body(resp).await;
    assert_eq!(doc["info"]["title"], "CareFlow API");
    assert!(doc["paths"]["/health"]["get"].is_object());
    assert!(doc["paths"]["/api/notes"]["post"].is_object());

    let resp = app.oneshot(get("/docs")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&html).contains("/openapi.json"));
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let app = router_with(ApiIngressConfig {
        cors_enabled: true,
        cors_origin: "http://localhost:3000".into(),
        ..ApiIngressConfig::default()
    });
    let resp = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/notes")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:3000"
    );
}

#[test]
fn invalid_cors_origin_fails_router_build() {
    let result = ApiIngress::new(ApiIngressConfig {
        cors_enabled: true,
        cors_origin: "bad\norigin".into(),
        ..ApiIngressConfig::default()
    })
    .build_router(&[&NotesModule]);
    assert!(result.is_err());
}

#[tokio::test]
async fn serve_stops_on_cancel() {
    let listener = api_ingress::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let server = tokio::spawn(api_ingress::serve(
        listener,
        router_with(ApiIngressConfig::default()),
        cancel.clone(),
    ));

    let body: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop after cancel")
        .unwrap();
    assert!(result.is_ok());
}
