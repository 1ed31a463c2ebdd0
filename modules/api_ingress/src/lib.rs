//! HTTP ingress: assembles module routes behind one middleware stack,
//! publishes the merged OpenAPI document, and serves until cancelled.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
    Router,
};
use carekit::{api::error_layer, RestfulModule};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use utoipa::OpenApi;

mod config;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(OpenApi)]
#[openapi(
    info(title = "CareFlow API", description = "Clinic appointment booking"),
    paths(web::health_check),
    components(schemas(web::Health)),
    tags((name = "system", description = "Operational endpoints"))
)]
struct IngressApiDoc;

/// Owns the HTTP surface: collects module routers and their OpenAPI
/// fragments, wraps them in the shared middleware stack.
pub struct ApiIngress {
    config: ApiIngressConfig,
    request_timeout: Duration,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Merged OpenAPI document for the ingress itself plus every module.
    pub fn build_openapi(&self, modules: &[&dyn RestfulModule]) -> utoipa::openapi::OpenApi {
        let mut doc = IngressApiDoc::openapi();
        doc.info.version = env!("CARGO_PKG_VERSION").to_string();
        for module in modules {
            doc.merge(module.openapi());
        }
        doc
    }

    /// Build the full application router.
    ///
    /// Middleware, outermost first:
    /// CORS -> SetRequestId -> PropagateRequestId -> Trace -> request id to extensions
    /// -> plain errors to problems -> Timeout -> BodyLimit -> routes
    pub fn build_router(&self, modules: &[&dyn RestfulModule]) -> Result<Router> {
        tracing::debug!("Building router for {} modules", modules.len());

        let mut router = Router::new().route("/health", get(web::health_check));
        for module in modules {
            router = module.register_rest(router)?;
        }

        if self.config.enable_docs {
            let doc = self.build_openapi(modules);
            let op_count: usize = doc
                .paths
                .paths
                .values()
                .map(|item| {
                    [
                        item.get.is_some(),
                        item.post.is_some(),
                        item.put.is_some(),
                        item.delete.is_some(),
                        item.patch.is_some(),
                    ]
                    .iter()
                    .filter(|present| **present)
                    .count()
                })
                .sum();
            tracing::info!("Publishing OpenAPI with {} operations", op_count);

            // Serialize once, serve as static JSON
            let openapi_value = Arc::new(serde_json::to_value(&doc)?);
            router = router
                .route(
                    "/openapi.json",
                    get(move || {
                        let v = openapi_value.clone();
                        async move {
                            (
                                [(header::CACHE_CONTROL, "no-store")],
                                axum::Json((*v).clone()),
                            )
                                .into_response()
                        }
                    }),
                )
                .route("/docs", get(web::serve_docs));
        }

        router = router.fallback(web::not_found);

        // Added innermost first; each `layer` call wraps everything before it.
        let x_request_id = request_id::header();
        router = router
            .layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes))
            .layer(TimeoutLayer::new(self.request_timeout))
            .layer(from_fn(error_layer::map_plain_errors))
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(request_id::create_trace_layer())
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        if self.config.cors_enabled {
            router = router.layer(self.cors_layer()?);
        }

        Ok(router)
    }

    fn cors_layer(&self) -> Result<CorsLayer> {
        let origin = self.config.cors_origin.trim();
        let allow_origin = if origin.is_empty() || origin == "*" {
            AllowOrigin::from(Any)
        } else {
            let value = HeaderValue::from_str(origin)
                .with_context(|| format!("invalid cors_origin '{origin}'"))?;
            AllowOrigin::exact(value)
        };
        Ok(CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
    }
}

/// Bind the listening socket. Port 0 picks a free port.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("HTTP server bound on {}", listener.local_addr()?);
    Ok(listener)
}

/// Serve until `cancel` fires, then drain in-flight requests.
pub async fn serve(listener: TcpListener, router: Router, cancel: CancellationToken) -> Result<()> {
    let shutdown = async move {
        cancel.cancelled().await;
        tracing::info!("HTTP server shutting down gracefully (cancellation)");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}
