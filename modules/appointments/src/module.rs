use std::sync::Arc;

use accounts::{contract::client::AccountsApi, gate::AuthGate};
use async_trait::async_trait;
use carekit::{DbModule, RestfulModule};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info, warn};
use utoipa::OpenApi;

use crate::api::rest::routes::{self, AppointmentsApiDoc};
use crate::config::AppointmentsConfig;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::storage::sea_orm_repo::SeaOrmAppointmentsRepository;

/// Appointments module: booking and status changes, gated by accounts tokens.
#[derive(Clone)]
pub struct Appointments {
    service: Arc<Service>,
    gate: AuthGate,
}

impl Appointments {
    pub fn new(
        db: DatabaseConnection,
        cfg: AppointmentsConfig,
        accounts: Arc<dyn AccountsApi>,
        gate: AuthGate,
    ) -> Self {
        info!("Initializing appointments module");
        debug!(
            "Loaded appointments config: enforce_doctor_ownership={}, enforce_pending_transitions={}",
            cfg.enforce_doctor_ownership, cfg.enforce_pending_transitions
        );
        if !cfg.enforce_doctor_ownership && !cfg.enforce_pending_transitions {
            warn!("Appointment status checks are disabled; any doctor may set any status");
        }

        let repo = SeaOrmAppointmentsRepository::new(db);
        let service_config = ServiceConfig {
            enforce_doctor_ownership: cfg.enforce_doctor_ownership,
            enforce_pending_transitions: cfg.enforce_pending_transitions,
        };
        let service = Service::new(Arc::new(repo), accounts, service_config);

        Self {
            service: Arc::new(service),
            gate,
        }
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }
}

#[async_trait]
impl DbModule for Appointments {
    fn name(&self) -> &'static str {
        "appointments"
    }

    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running appointments database migrations");
        crate::infra::storage::migrations::Migrator::up(db, None).await?;
        info!("Appointments database migrations completed successfully");
        Ok(())
    }
}

impl RestfulModule for Appointments {
    fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering appointments REST routes");
        let router = routes::register_routes(router, self.service.clone(), &self.gate)?;
        info!("Appointments REST routes registered successfully");
        Ok(router)
    }

    fn openapi(&self) -> utoipa::openapi::OpenApi {
        AppointmentsApiDoc::openapi()
    }
}
