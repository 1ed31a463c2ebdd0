//! Role-gating middleware for routes that need an authenticated caller.
//!
//! ```ignore
//! let router = gate.protect(Router::new().route("/api/my-appointments", get(h)), &[Role::Patient]);
//! // handlers then take `Extension<Caller>`
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::{from_fn_with_state, Next},
    response::Response,
    Router,
};
use carekit::api::problem::{self, ProblemResponse};
use carekit::http::REQUEST_ID_HEADER;
use tracing::{debug, warn};

use crate::contract::{client::AccountsApi, error::AccountsError, model::Role};

/// Builds role guards backed by the accounts token verifier.
#[derive(Clone)]
pub struct AuthGate {
    api: Arc<dyn AccountsApi>,
}

impl AuthGate {
    pub fn new(api: Arc<dyn AccountsApi>) -> Self {
        Self { api }
    }

    /// Guard admitting callers whose role is one of `roles`.
    pub fn require(&self, roles: &[Role]) -> RoleGuard {
        RoleGuard {
            api: self.api.clone(),
            roles: roles.into(),
        }
    }

    /// Apply a guard to every route already registered on `router`.
    pub fn protect<S>(&self, router: Router<S>, roles: &[Role]) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(from_fn_with_state(self.require(roles), authorize))
    }
}

/// Middleware state: the token verifier and the admitted roles.
#[derive(Clone)]
pub struct RoleGuard {
    api: Arc<dyn AccountsApi>,
    roles: Arc<[Role]>,
}

impl RoleGuard {
    pub fn admits(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Verify the bearer token, check the role, and expose the `Caller` to handlers.
pub async fn authorize(
    State(guard): State<RoleGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ProblemResponse> {
    let path = req.uri().path().to_string();
    let request_id = request_id(req.headers());
    let reject = |mut p: ProblemResponse| {
        p.0 = p.0.with_instance(path.clone());
        if let Some(id) = &request_id {
            p.0 = p.0.with_request_id(id.clone());
        }
        p
    };

    let Some(token) = bearer_token(req.headers()) else {
        debug!(%path, "Rejected request without bearer token");
        return Err(reject(problem::unauthorized("Missing bearer token")));
    };

    let caller = match guard.api.authenticate(token).await {
        Ok(caller) => caller,
        Err(AccountsError::Unauthorized { message }) => {
            debug!(%path, %message, "Rejected bearer token");
            return Err(reject(problem::unauthorized(message)));
        }
        Err(e) => {
            tracing::error!(error = %e, "Token verification failed");
            return Err(reject(problem::internal_error(
                "Token verification failed",
            )));
        }
    };

    if !guard.admits(caller.role) {
        warn!(user_id = %caller.user_id, role = %caller.role, %path, "Role not permitted");
        let expected = guard
            .roles
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(" or ");
        return Err(reject(problem::forbidden(format!(
            "This action requires the {expected} role"
        ))));
    }

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
