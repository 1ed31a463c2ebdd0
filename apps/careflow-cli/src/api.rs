//! HTTP client for the CareFlow API.

use carekit::http::TracedClient;
use carekit::api::Problem;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::model::{
    Appointment, BookingRequest, Doctor, LoginRequest, LoginResponse, RegisterRequest, Status,
    StatusUpdate, UserSummary,
};
use crate::session::Session;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Normalize a configured API base URL.
///
/// Trims whitespace and trailing slashes and makes sure the path ends in
/// `/api`. Missing, relative or unparsable values fall back to
/// [`DEFAULT_API_URL`].
pub fn normalize_base_url(raw: Option<&str>) -> String {
    let trimmed = raw.unwrap_or("").trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_API_URL.to_string();
    }

    let mut url = match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        _ => return DEFAULT_API_URL.to_string(),
    };

    let path = url.path().trim_end_matches('/').to_string();
    let path = if path.is_empty() {
        "/api".to_string()
    } else if path.ends_with("/api") {
        path
    } else {
        format!("{path}/api")
    };
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    url.to_string().trim_end_matches('/').to_string()
}

pub struct ApiClient {
    http: TracedClient,
    base: String,
}

impl ApiClient {
    pub fn new(base_url: Option<&str>) -> Self {
        Self::with_client(TracedClient::default(), base_url)
    }

    pub fn with_client(http: TracedClient, base_url: Option<&str>) -> Self {
        Self {
            http,
            base: normalize_base_url(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub async fn register(&self, req: &RegisterRequest) -> ClientResult<UserSummary> {
        let builder = self.request(Method::POST, "/register").json(req);
        self.send(builder).await
    }

    pub async fn login(&self, req: &LoginRequest) -> ClientResult<LoginResponse> {
        let builder = self.request(Method::POST, "/login").json(req);
        self.send(builder).await
    }

    pub async fn doctors(&self) -> ClientResult<Vec<Doctor>> {
        self.send(self.request(Method::GET, "/doctors")).await
    }

    pub async fn book(&self, session: &Session, req: &BookingRequest) -> ClientResult<Appointment> {
        let builder = self.authed(session, Method::POST, "/appointment")?.json(req);
        self.send(builder).await
    }

    pub async fn my_appointments(&self, session: &Session) -> ClientResult<Vec<Appointment>> {
        self.send(self.authed(session, Method::GET, "/my-appointments")?)
            .await
    }

    pub async fn doctor_appointments(&self, session: &Session) -> ClientResult<Vec<Appointment>> {
        self.send(self.authed(session, Method::GET, "/doctor-appointments")?)
            .await
    }

    pub async fn update_status(
        &self,
        session: &Session,
        id: Uuid,
        status: Status,
    ) -> ClientResult<Appointment> {
        let builder = self
            .authed(session, Method::PUT, &format!("/appointment/{id}"))?
            .json(&StatusUpdate { status });
        self.send(builder).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, &format!("{}{}", self.base, path))
    }

    /// Request carrying the session's bearer token; refuses expired sessions
    /// without contacting the server.
    fn authed(&self, session: &Session, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        session.ensure(None)?;
        Ok(self.request(method, path).bearer_auth(&session.token))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let req = builder.build()?;
        debug!(method = %req.method(), url = %req.url(), "Sending request");
        let resp = self.http.execute(req).await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if status.is_success() {
            return serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()));
        }
        Err(api_error(status, &body))
    }
}

/// Turn an error response into a user-facing error, preferring the problem
/// document's `detail`.
fn api_error(status: StatusCode, body: &[u8]) -> ClientError {
    if let Ok(problem) = serde_json::from_slice::<Problem>(body) {
        let message = if problem.detail.is_empty() {
            problem.title
        } else {
            problem.detail
        };
        return ClientError::Api {
            status: status.as_u16(),
            code: problem.code,
            message,
        };
    }

    #[derive(serde::Deserialize)]
    struct Legacy {
        message: String,
    }
    let message = serde_json::from_slice::<Legacy>(body)
        .map(|l| l.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    ClientError::Api {
        status: status.as_u16(),
        code: String::new(),
        message,
    }
}
