//! Server configuration: built-in defaults, then the YAML file, then
//! `APP__`-prefixed environment variables (`APP__SERVER__PORT=8080`).
//!
//! Global sections are typed here. Module sections (`api_ingress`,
//! `accounts`, `appointments`) stay raw in [`AppConfig::modules`] and are
//! parsed by their owners through [`AppConfig::module_config`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment, Provider,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::paths::home_dir::resolve_home_dir;

/// Environment variable prefix; `__` separates nested keys.
pub const ENV_PREFIX: &str = "APP__";
/// Directory created under the user's home when `server.home_dir` is empty.
pub const HOME_SUBDIR: &str = ".careflow";

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://database/careflow.db";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// Absent means the server runs without a database unless `--mock`.
    pub database: Option<DatabaseConfig>,
    pub logging: Option<LoggingConfig>,
    /// Raw module sections keyed by module name.
    #[serde(default)]
    pub modules: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Absolute after loading; relative database and log paths hang off it.
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    /// Per-request timeout; 0 keeps the ingress default.
    #[serde(default)]
    pub timeout_sec: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            host: "127.0.0.1".to_owned(),
            port: DEFAULT_PORT,
            timeout_sec: 0,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `sqlite://relative/or/absolute.db`, `sqlite::memory:` or `postgres://...`
    pub url: String,
    pub max_conns: Option<u32>,
    /// SQLite only.
    pub busy_timeout_ms: Option<u32>,
}

/// Log sections keyed by subsystem (a crate name such as `accounts` or
/// `sqlx`). The `default` section takes whatever no other section claims.
pub type LoggingConfig = BTreeMap<String, LogSection>;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    /// trace, debug, info, warn, error or off
    pub console_level: String,
    /// Relative to `server.home_dir`; empty disables the file.
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

impl LogSection {
    pub fn console_only(level: &str) -> Self {
        Self {
            console_level: level.to_owned(),
            file: String::new(),
            file_level: String::new(),
            max_backups: None,
            max_size_mb: None,
        }
    }
}

pub fn default_logging_config() -> LoggingConfig {
    BTreeMap::from([(
        "default".to_owned(),
        LogSection {
            console_level: "info".to_owned(),
            file: "logs/careflow.log".to_owned(),
            file_level: "debug".to_owned(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    )])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: Some(DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_owned(),
                max_conns: Some(10),
                busy_timeout_ms: Some(5000),
            }),
            logging: Some(default_logging_config()),
            modules: BTreeMap::new(),
        }
    }
}

/// Command-line values that win over every configuration layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    /// `-v` count: 1 is debug, 2 or more is trace.
    pub verbose: u8,
}

impl AppConfig {
    /// Load from `path` when given, otherwise use the built-in defaults.
    /// Either way `server.home_dir` comes back absolute and existing.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let mut config = Self::default();
                config.normalize_home_dir()?;
                Ok(config)
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            bail!("config file not found: {}", path.display());
        }
        Self::from_layers(Yaml::file(path))
    }

    /// Defaults, then `file`, then the environment.
    fn from_layers(file: impl Provider) -> Result<Self> {
        // Optional sections only appear when a layer sets them.
        let base = AppConfig {
            database: None,
            logging: None,
            ..AppConfig::default()
        };
        let figment = Figment::from(Serialized::defaults(base))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self> {
        let mut config: AppConfig = figment
            .extract()
            .context("Failed to extract config from figment")?;
        config.normalize_home_dir()?;
        Ok(config)
    }

    fn normalize_home_dir(&mut self) -> Result<()> {
        let configured = Some(self.server.home_dir.trim())
            .filter(|raw| !raw.is_empty())
            .map(str::to_owned);
        let resolved: PathBuf = resolve_home_dir(configured, HOME_SUBDIR, true)
            .context("Failed to resolve server.home_dir")?;
        self.server.home_dir = resolved.to_string_lossy().into_owned();
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Typed view of one module section. A missing section yields
    /// `T::default()`; a malformed one is an error naming the module.
    pub fn module_config<T>(&self, module: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.modules.get(module) else {
            return Ok(T::default());
        };
        serde_json::from_value(raw.clone())
            .with_context(|| format!("Invalid configuration for module '{module}'"))
    }

    pub fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        let level = match overrides.verbose {
            0 => return,
            1 => "debug",
            _ => "trace",
        };
        let logging = self.logging.get_or_insert_with(default_logging_config);
        logging
            .entry("default".to_owned())
            .or_insert_with(|| LogSection::console_only("info"))
            .console_level = level.to_owned();
    }
}
