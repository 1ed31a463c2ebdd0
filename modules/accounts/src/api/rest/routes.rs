use std::sync::Arc;

use axum::{routing::post, Extension, Router};
use carekit::api::problem::{FieldError, Problem};
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::register, handlers::login),
    components(schemas(
        dto::RegisterReq,
        dto::LoginReq,
        dto::UserDto,
        dto::LoginResp,
        Problem,
        FieldError
    )),
    tags((name = "accounts", description = "Registration and login"))
)]
pub struct AccountsApiDoc;

pub fn register_routes(router: Router, service: Arc<Service>) -> anyhow::Result<Router> {
    // POST /api/register - Create a patient or doctor account
    // POST /api/login - Issue a bearer token
    let accounts = Router::new()
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .layer(Extension(service));

    Ok(router.merge(accounts))
}
