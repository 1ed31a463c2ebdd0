use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use carekit::{DbModule, RestfulModule};
use rand::RngCore;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info, warn};
use utoipa::OpenApi;

use crate::api::rest::routes::{self, AccountsApiDoc};
use crate::config::{AccountsConfig, MAX_TOKEN_TTL_HOURS};
use crate::contract::client::AccountsApi;
use crate::domain::password::{Argon2Hasher, PasswordHasher};
use crate::domain::service::{Service, ServiceConfig};
use crate::domain::token::TokenIssuer;
use crate::gate::AuthGate;
use crate::gateways::local::AccountsLocalClient;
use crate::infra::storage::sea_orm_repo::SeaOrmUsersRepository;

/// Accounts module: users, credentials and bearer tokens.
#[derive(Clone)]
pub struct Accounts {
    service: Arc<Service>,
}

impl Accounts {
    pub fn new(db: DatabaseConnection, cfg: AccountsConfig) -> anyhow::Result<Self> {
        Self::with_hasher(db, cfg, Arc::new(Argon2Hasher::new()))
    }

    /// Same as [`Accounts::new`] with a custom password hasher.
    pub fn with_hasher(
        db: DatabaseConnection,
        cfg: AccountsConfig,
        hasher: Arc<dyn PasswordHasher>,
    ) -> anyhow::Result<Self> {
        info!("Initializing accounts module");
        debug!(
            "Loaded accounts config: token_ttl_hours={}, min_password_length={}",
            cfg.token_ttl_hours, cfg.min_password_length
        );

        if cfg.token_ttl_hours == 0 || cfg.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            bail!(
                "accounts.token_ttl_hours must be between 1 and {MAX_TOKEN_TTL_HOURS}, got {}",
                cfg.token_ttl_hours
            );
        }

        let secret = if cfg.jwt_secret.is_empty() {
            warn!("accounts.jwt_secret is not set; using a random secret, tokens will not survive a restart");
            let mut bytes = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut bytes);
            bytes.to_vec()
        } else {
            cfg.jwt_secret.into_bytes()
        };
        let tokens = TokenIssuer::new(
            &secret,
            chrono::Duration::hours(i64::from(cfg.token_ttl_hours)),
        );

        let repo = SeaOrmUsersRepository::new(db);
        let service_config = ServiceConfig {
            min_password_length: cfg.min_password_length,
            ..ServiceConfig::default()
        };
        let service = Service::new(Arc::new(repo), hasher, tokens, service_config);

        Ok(Self {
            service: Arc::new(service),
        })
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    /// In-process client for other modules.
    pub fn client(&self) -> Arc<dyn AccountsApi> {
        Arc::new(AccountsLocalClient::new(self.service.clone()))
    }

    /// Route gate backed by this module's token verifier.
    pub fn gate(&self) -> AuthGate {
        AuthGate::new(self.client())
    }
}

#[async_trait]
impl DbModule for Accounts {
    fn name(&self) -> &'static str {
        "accounts"
    }

    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running accounts database migrations");
        crate::infra::storage::migrations::Migrator::up(db, None).await?;
        info!("Accounts database migrations completed successfully");
        Ok(())
    }
}

impl RestfulModule for Accounts {
    fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering accounts REST routes");
        let router = routes::register_routes(router, self.service.clone())?;
        info!("Accounts REST routes registered successfully");
        Ok(router)
    }

    fn openapi(&self) -> utoipa::openapi::OpenApi {
        AccountsApiDoc::openapi()
    }
}
