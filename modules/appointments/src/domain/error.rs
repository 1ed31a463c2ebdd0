use accounts::contract::error::AccountsError;
use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::AppointmentStatus;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Appointment not found: {id}")]
    AppointmentNotFound { id: Uuid },

    #[error("Doctor '{reference}' not found")]
    DoctorNotFound { reference: String },

    #[error("{count} doctors are named '{name}'; choose a department or doctor id")]
    AmbiguousDoctor { name: String, count: usize },

    #[error("{doctor} works in {actual}, not {requested}")]
    DepartmentMismatch {
        doctor: String,
        actual: String,
        requested: String,
    },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("Accounts lookup failed: {message}")]
    Accounts { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn appointment_not_found(id: Uuid) -> Self {
        Self::AppointmentNotFound { id }
    }

    pub fn doctor_not_found(reference: impl Into<String>) -> Self {
        Self::DoctorNotFound {
            reference: reference.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

impl From<AccountsError> for DomainError {
    fn from(e: AccountsError) -> Self {
        match e {
            AccountsError::NotFound { id } => Self::doctor_not_found(id.to_string()),
            other => Self::Accounts {
                message: other.to_string(),
            },
        }
    }
}
