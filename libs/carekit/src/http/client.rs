//! Traced HTTP client.
//!
//! Wraps `reqwest::Client` so every outgoing request runs inside an
//! `outgoing_http` span and carries an `x-request-id` header that the
//! CareFlow ingress propagates into its own request span.

use reqwest::header::{HeaderName, HeaderValue};
use tracing::{field::Empty, Instrument, Level};

/// Header used to correlate client and server logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct TracedClient {
    inner: reqwest::Client,
}

impl TracedClient {
    pub fn new(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Execute a built request inside an `outgoing_http` span,
    /// adding an `x-request-id` header unless the caller set one.
    pub async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let name = HeaderName::from_static(REQUEST_ID_HEADER);
        if !req.headers().contains_key(&name) {
            if let Ok(v) = HeaderValue::from_str(&nanoid::nanoid!()) {
                req.headers_mut().insert(name.clone(), v);
            }
        }
        let request_id = req
            .headers()
            .get(&name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("n/a")
            .to_owned();

        let span = tracing::span!(
            Level::INFO, "outgoing_http",
            http.method = %req.method(),
            http.url = %req.url(),
            request_id = %request_id,
            http.status_code = Empty,
            error = Empty,
        );

        let response = self.inner.execute(req).instrument(span.clone()).await?;

        span.record("http.status_code", response.status().as_u16());
        if response.status().is_client_error() || response.status().is_server_error() {
            span.record("error", true);
        }

        Ok(response)
    }

    pub async fn get(&self, url: &str) -> reqwest::Result<reqwest::Response> {
        let req = self.inner.get(url).build()?;
        self.execute(req).await
    }

    /// Start a request builder; finish it with `build()` and pass it to [`Self::execute`].
    pub fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.inner.request(method, url)
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

impl From<reqwest::Client> for TracedClient {
    fn from(c: reqwest::Client) -> Self {
        Self::new(c)
    }
}

impl Default for TracedClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}
