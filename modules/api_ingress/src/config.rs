use serde::{Deserialize, Serialize};

/// HTTP ingress configuration (`modules.api_ingress`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    /// Serve `/openapi.json` and `/docs`.
    #[serde(default)]
    pub enable_docs: bool,
    #[serde(default)]
    pub cors_enabled: bool,
    /// Allowed browser origin; `*` allows any.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            enable_docs: false,
            cors_enabled: false,
            cors_origin: default_cors_origin(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

fn default_cors_origin() -> String {
    "*".to_string()
}

fn default_body_limit_bytes() -> usize {
    1024 * 1024
}
