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
        DomainError::UserNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "ACCOUNTS_USER_NOT_FOUND",
            "User not found",
            format!("User with id {id} was not found"),
            instance,
        ),
        DomainError::EmailAlreadyExists { email } => from_parts(
            StatusCode::CONFLICT,
            "ACCOUNTS_EMAIL_CONFLICT",
            "Email already exists",
            format!("Email '{email}' is already registered"),
            instance,
        ),
        DomainError::InvalidEmail { email } => {
            let detail = format!("Email '{email}' is invalid");
            let mut p = from_parts(
                StatusCode::BAD_REQUEST,
                "ACCOUNTS_INVALID_EMAIL",
                "Invalid email",
                detail.clone(),
                instance,
            );
            p.0 = p.0.with_field_error(FieldError::at("email", detail));
            p
        }
        DomainError::Validation { field, message } => {
            let mut p = from_parts(
                StatusCode::BAD_REQUEST,
                "ACCOUNTS_VALIDATION",
                "Validation error",
                message.clone(),
                instance,
            );
            p.0 = p.0.with_field_error(FieldError::at(field, message.clone()));
            p
        }
        DomainError::InvalidCredentials => from_parts(
            StatusCode::UNAUTHORIZED,
            "ACCOUNTS_INVALID_CREDENTIALS",
            "Invalid credentials",
            e.to_string(),
            instance,
        ),
        DomainError::RoleMismatch { .. } => from_parts(
            StatusCode::UNAUTHORIZED,
            "ACCOUNTS_ROLE_MISMATCH",
            "Role mismatch",
            e.to_string(),
            instance,
        ),
        DomainError::TokenExpired | DomainError::InvalidToken { .. } => from_parts(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Unauthorized",
            e.to_string(),
            instance,
        ),
        DomainError::Credential { .. } | DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Internal error in accounts");
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
    use crate::contract::model::Role;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (DomainError::email_already_exists("a@b.io".into()), 409),
            (DomainError::validation("name", "Name is required"), 400),
            (DomainError::InvalidCredentials, 401),
            (DomainError::role_mismatch(Role::Doctor, Role::Patient), 401),
            (DomainError::database("disk full"), 500),
        ];
        for (err, status) in cases {
            assert_eq!(map_domain_error(&err, "/api/x").0.status, status, "{err}");
        }
    }

    #[test]
    fn validation_problems_point_at_the_field() {
        let p = map_domain_error(&DomainError::validation("name", "Name is required"), "/api/register").0;
        let errors = p.errors.expect("field errors");
        assert_eq!(errors, vec![FieldError::at("name", "Name is required")]);
        assert_eq!(errors[0].pointer, "/name");

        let p = map_domain_error(&DomainError::invalid_email("nope".into()), "/api/register").0;
        assert_eq!(p.errors.unwrap()[0].pointer, "/email");
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let p = map_domain_error(&DomainError::database("secret table"), "/api/login").0;
        assert!(!p.detail.contains("secret"));
        assert_eq!(p.instance, "/api/login");
    }
}
