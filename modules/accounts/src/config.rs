use serde::{Deserialize, Serialize};

/// Upper bound for `token_ttl_hours`: one year.
pub const MAX_TOKEN_TTL_HOURS: u32 = 24 * 365;

/// Configuration for the accounts module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountsConfig {
    /// HMAC secret for bearer tokens. Empty means "generate one at startup".
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u32,
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
            min_password_length: default_min_password_length(),
        }
    }
}

fn default_token_ttl_hours() -> u32 {
    24
}

fn default_min_password_length() -> usize {
    6
}
