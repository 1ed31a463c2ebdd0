use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::AccountsApi,
    error::AccountsError,
    model::{Caller, Doctor, User},
};
use crate::domain::service::Service;

/// Local implementation of the AccountsApi trait that delegates to the domain service
pub struct AccountsLocalClient {
    service: Arc<Service>,
}

impl AccountsLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AccountsApi for AccountsLocalClient {
    async fn get_user(&self, id: Uuid) -> Result<User, AccountsError> {
        self.service.get_user(id).await.map_err(Into::into)
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, AccountsError> {
        self.service.list_doctors().await.map_err(Into::into)
    }

    async fn find_doctors_by_name(&self, name: &str) -> Result<Vec<Doctor>, AccountsError> {
        self.service
            .find_doctors_by_name(name)
            .await
            .map_err(Into::into)
    }

    async fn authenticate(&self, token: &str) -> Result<Caller, AccountsError> {
        self.service.authenticate(token).map_err(Into::into)
    }
}
