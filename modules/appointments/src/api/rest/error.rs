use axum::http::StatusCode;
use carekit::api::problem::{FieldError, Problem, ProblemResponse};

use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    ProblemResponse(Problem::coded(status, code, title, detail).with_instance(instance))
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::AppointmentNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "APPOINTMENTS_NOT_FOUND",
            "Appointment not found",
            format!("Appointment with id {id} was not found"),
            instance,
        ),
        DomainError::DoctorNotFound { .. }
        | DomainError::AmbiguousDoctor { .. }
        | DomainError::DepartmentMismatch { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "APPOINTMENTS_DOCTOR",
            "Invalid doctor",
            e.to_string(),
            instance,
        ),
        DomainError::Validation { field, message } => {
            let mut p = from_parts(
                StatusCode::BAD_REQUEST,
                "APPOINTMENTS_VALIDATION",
                "Validation error",
                message.clone(),
                instance,
            );
            p.0 = p.0.with_field_error(FieldError::at(field, message.clone()));
            p
        }
        DomainError::InvalidTransition { .. } => from_parts(
            StatusCode::CONFLICT,
            "APPOINTMENTS_INVALID_TRANSITION",
            "Invalid status transition",
            e.to_string(),
            instance,
        ),
        DomainError::Forbidden { message } => from_parts(
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "Forbidden",
            message.clone(),
            instance,
        ),
        DomainError::Accounts { .. } | DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Internal error in appointments");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Internal error",
                "An internal error occurred",
                instance,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::AppointmentStatus;

    #[test]
    fn transition_conflict_is_409() {
        let p = map_domain_error(
            &DomainError::InvalidTransition {
                from: AppointmentStatus::Accepted,
                to: AppointmentStatus::Rejected,
            },
            "/api/appointment/x",
        )
        .0;
        assert_eq!(p.status, 409);
        assert_eq!(p.detail, "Cannot change status from accepted to rejected");
    }

    #[test]
    fn validation_problem_points_at_the_field() {
        let p = map_domain_error(
            &DomainError::validation("doctorName", "Doctor name is required"),
            "/api/appointment",
        )
        .0;
        assert_eq!(p.status, 400);
        assert_eq!(p.errors.unwrap()[0].pointer, "/doctorName");
    }

    #[test]
    fn doctor_resolution_failures_are_400() {
        let p = map_domain_error(&DomainError::doctor_not_found("Dr. Who"), "/api/appointment").0;
        assert_eq!(p.status, 400);
        assert!(p.detail.contains("Dr. Who"));
    }
}
