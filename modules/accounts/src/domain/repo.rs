use crate::contract::model::{Role, User};
use async_trait::async_trait;
use uuid::Uuid;

/// A user together with its password hash; never leaves the domain layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// Port for the domain layer: persistence operations the domain needs.
/// Emails reach the repository already normalized (trimmed, lowercase).
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Load a user by id.
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Load a user and its password hash by email.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>>;
    /// Check uniqueness by email.
    async fn email_exists(&self, email: &str) -> anyhow::Result<bool>;
    /// Insert a fully-formed record. Returns false if the email is already taken.
    async fn insert(&self, record: UserRecord) -> anyhow::Result<bool>;
    /// All users with the given role, ordered by name.
    async fn list_by_role(&self, role: Role) -> anyhow::Result<Vec<User>>;
    /// Users with the given role whose name matches exactly.
    async fn find_by_name_and_role(&self, name: &str, role: Role) -> anyhow::Result<Vec<User>>;
}
