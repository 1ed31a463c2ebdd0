use async_trait::async_trait;
use sea_orm::DatabaseConnection;

/// A module that owns tables and knows how to bring its schema up to date.
#[async_trait]
pub trait DbModule: Send + Sync {
    /// Stable module name, also the key of its section in `modules` config.
    fn name(&self) -> &'static str;

    /// Apply pending migrations for this module's tables.
    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()>;
}

/// A module that contributes HTTP routes and their OpenAPI description.
pub trait RestfulModule: Send + Sync {
    /// Attach this module's routes to `router` and return it.
    fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router>;

    /// OpenAPI fragment describing the routes registered above.
    fn openapi(&self) -> utoipa::openapi::OpenApi;
}
