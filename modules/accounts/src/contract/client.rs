use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::AccountsError,
    model::{Caller, Doctor, User},
};

/// Public API of the accounts module for in-process consumers.
#[async_trait]
pub trait AccountsApi: Send + Sync {
    /// Get a user by ID
    async fn get_user(&self, id: Uuid) -> Result<User, AccountsError>;

    /// All doctors, ordered by name
    async fn list_doctors(&self) -> Result<Vec<Doctor>, AccountsError>;

    /// Doctors whose display name matches exactly (there may be several)
    async fn find_doctors_by_name(&self, name: &str) -> Result<Vec<Doctor>, AccountsError>;

    /// Verify a bearer token and return the identity it carries
    async fn authenticate(&self, token: &str) -> Result<Caller, AccountsError>;
}
