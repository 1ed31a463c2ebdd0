use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{AccessToken, Caller, Credentials, Doctor, NewUser, Role, User};
use crate::domain::error::DomainError;
use crate::domain::password::PasswordHasher;
use crate::domain::repo::{UserRecord, UsersRepository};
use crate::domain::token::TokenIssuer;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("static email pattern"));

/// Domain service: registration, login and token verification.
/// Depends only on ports (repository, hasher) and the token issuer.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenIssuer,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub min_password_length: usize,
    pub max_name_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            min_password_length: 6,
            max_name_length: 100,
        }
    }
}

/// Canonical form used for storage and lookups (case-insensitive uniqueness).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Service {
    pub fn new(
        repo: Arc<dyn UsersRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenIssuer,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            hasher,
            tokens,
            config,
        }
    }

    #[instrument(
        name = "accounts.service.register",
        skip(self, new_user),
        fields(email = %new_user.email, role = %new_user.role)
    )]
    pub async fn register(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Registering new user");

        let name = new_user.name.trim().to_string();
        let email = normalize_email(&new_user.email);
        let department = match new_user.role {
            Role::Doctor => new_user
                .department
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            Role::Patient => None,
        };

        self.validate_name(&name)?;
        self.validate_email(&email)?;
        self.validate_password(&new_user.password)?;
        if new_user.role == Role::Doctor && department.is_none() {
            return Err(DomainError::validation(
                "department",
                "Department is required for doctors",
            ));
        }

        if self
            .repo
            .email_exists(&email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            return Err(DomainError::email_already_exists(email));
        }

        let password_hash = self.hash_password(new_user.password).await?;

        let user = User {
            id: Uuid::new_v4(),
            name,
            email,
            role: new_user.role,
            department,
            created_at: Utc::now(),
        };

        let inserted = self
            .repo
            .insert(UserRecord {
                user: user.clone(),
                password_hash,
            })
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !inserted {
            // lost a race against a concurrent registration
            return Err(DomainError::email_already_exists(user.email));
        }

        info!(user_id = %user.id, "Successfully registered user");
        Ok(user)
    }

    #[instrument(
        name = "accounts.service.login",
        skip(self, credentials),
        fields(email = %credentials.email, role = %credentials.role)
    )]
    pub async fn login(&self, credentials: Credentials) -> Result<AccessToken, DomainError> {
        debug!("Login attempt");

        let email = normalize_email(&credentials.email);
        let record = self
            .repo
            .find_by_email(&email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or(DomainError::InvalidCredentials)?;

        if !self
            .verify_password(credentials.password, record.password_hash)
            .await?
        {
            warn!("Password mismatch");
            return Err(DomainError::InvalidCredentials);
        }

        if record.user.role != credentials.role {
            warn!(actual = %record.user.role, "Role mismatch on login");
            return Err(DomainError::role_mismatch(
                credentials.role,
                record.user.role,
            ));
        }

        let token = self.tokens.issue(&record.user)?;
        info!(user_id = %record.user.id, expires_at = %token.expires_at, "Issued access token");
        Ok(token)
    }

    /// Verify a bearer token and return the caller identity it encodes.
    pub fn authenticate(&self, token: &str) -> Result<Caller, DomainError> {
        self.tokens.verify(token)?.into_caller()
    }

    #[instrument(name = "accounts.service.get_user", skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    #[instrument(name = "accounts.service.list_doctors", skip(self))]
    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DomainError> {
        let doctors = self
            .repo
            .list_by_role(Role::Doctor)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!("Found {} doctors", doctors.len());
        Ok(doctors.into_iter().map(to_doctor).collect())
    }

    #[instrument(name = "accounts.service.find_doctors_by_name", skip(self))]
    pub async fn find_doctors_by_name(&self, name: &str) -> Result<Vec<Doctor>, DomainError> {
        let doctors = self
            .repo
            .find_by_name_and_role(name.trim(), Role::Doctor)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        Ok(doctors.into_iter().map(to_doctor).collect())
    }

    // --- credential helpers (CPU-bound, kept off the async workers) ---

    async fn hash_password(&self, password: String) -> Result<String, DomainError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::credential(e.to_string()))?
            .map_err(|e| DomainError::credential(e.to_string()))
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, DomainError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| DomainError::credential(e.to_string()))?
            .map_err(|e| DomainError::credential(e.to_string()))
    }

    // --- validation helpers ---

    fn validate_name(&self, name: &str) -> Result<(), DomainError> {
        if name.is_empty() {
            return Err(DomainError::validation("name", "Name is required"));
        }
        if name.chars().count() > self.config.max_name_length {
            return Err(DomainError::validation(
                "name",
                format!(
                    "Name is longer than {} characters",
                    self.config.max_name_length
                ),
            ));
        }
        Ok(())
    }

    fn validate_email(&self, email: &str) -> Result<(), DomainError> {
        if !EMAIL_RE.is_match(email) {
            return Err(DomainError::invalid_email(email.to_string()));
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<(), DomainError> {
        if password.chars().count() < self.config.min_password_length {
            return Err(DomainError::validation(
                "password",
                format!(
                    "Password must be at least {} characters",
                    self.config.min_password_length
                ),
            ));
        }
        Ok(())
    }
}

fn to_doctor(user: User) -> Doctor {
    Doctor {
        id: user.id,
        name: user.name,
        department: user.department.unwrap_or_default(),
    }
}
