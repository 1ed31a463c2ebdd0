use std::sync::Arc;

use axum::{
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use carekit::api::{
    problem::{Problem, ProblemResponse},
    JsonBody,
};
use tracing::{error, info};

use crate::api::rest::dto::{LoginReq, LoginResp, RegisterReq, UserDto};
use crate::api::rest::error::map_domain_error;
use crate::contract::model::{Credentials, NewUser};
use crate::domain::error::DomainError;
use crate::domain::service::Service;

/// Register a new patient or doctor
#[utoipa::path(
    post,
    path = "/api/register",
    tag = "accounts",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered", body = UserDto),
        (status = 400, description = "Validation error", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Email already registered", body = Problem, content_type = "application/problem+json"),
        (status = 500, description = "Internal Server Error", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn register(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    JsonBody(req_body): JsonBody<RegisterReq>,
) -> Result<(StatusCode, Json<UserDto>), ProblemResponse> {
    info!(email = %req_body.email, role = %req_body.role, "Register request");

    let result = match NewUser::try_from(req_body) {
        Ok(new_user) => svc.register(new_user).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(user) => Ok((StatusCode::CREATED, Json(UserDto::from(user)))),
        Err(e) => {
            log_failure("register", &e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "accounts",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Token issued", body = LoginResp),
        (status = 400, description = "Validation error", body = Problem, content_type = "application/problem+json"),
        (status = 401, description = "Invalid credentials or role mismatch", body = Problem, content_type = "application/problem+json"),
        (status = 500, description = "Internal Server Error", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn login(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    JsonBody(req_body): JsonBody<LoginReq>,
) -> Result<Json<LoginResp>, ProblemResponse> {
    info!(email = %req_body.email, "Login request");

    let result = match Credentials::try_from(req_body) {
        Ok(credentials) => svc.login(credentials).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(token) => Ok(Json(LoginResp::from(token))),
        Err(e) => {
            log_failure("login", &e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

fn log_failure(op: &str, e: &DomainError) {
    match e {
        DomainError::Database { .. } | DomainError::Credential { .. } => {
            error!("Failed to {op}: {e}")
        }
        _ => info!("Rejected {op}: {e}"),
    }
}
