use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{AccessToken, Credentials, NewUser, Role, User};
use crate::domain::error::DomainError;

/// REST DTO for registration. Missing fields deserialize as empty and are
/// reported by domain validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterReq {
    pub name: String,
    pub email: String,
    pub password: String,
    /// "patient" or "doctor"
    pub role: String,
    /// Required for doctors, ignored for patients
    pub department: Option<String>,
}

/// REST DTO for login
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginReq {
    pub email: String,
    pub password: String,
    /// Defaults to "patient" when omitted
    pub role: Option<String>,
}

/// Identity summary returned after registration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[schema(value_type = String, example = "patient")]
    pub role: Role,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResp {
    pub token: String,
    #[schema(value_type = String, example = "doctor")]
    pub role: Role,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

fn parse_role(raw: &str) -> Result<Role, DomainError> {
    raw.parse()
        .map_err(|e: crate::contract::model::UnknownRole| DomainError::validation("role", e.to_string()))
}

impl TryFrom<RegisterReq> for NewUser {
    type Error = DomainError;

    fn try_from(req: RegisterReq) -> Result<Self, Self::Error> {
        Ok(Self {
            role: parse_role(&req.role)?,
            name: req.name,
            email: req.email,
            password: req.password,
            department: req.department,
        })
    }
}

impl TryFrom<LoginReq> for Credentials {
    type Error = DomainError;

    fn try_from(req: LoginReq) -> Result<Self, Self::Error> {
        let role = match req.role.as_deref() {
            None | Some("") => Role::Patient,
            Some(raw) => parse_role(raw)?,
        };
        Ok(Self {
            email: req.email,
            password: req.password,
            role,
        })
    }
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            department: user.department,
        }
    }
}

impl From<AccessToken> for LoginResp {
    fn from(t: AccessToken) -> Self {
        Self {
            token: t.token,
            role: t.role,
            name: t.name,
            expires_at: t.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_req_reads_camel_case_and_tolerates_missing_fields() {
        let req: RegisterReq =
            serde_json::from_str(r#"{"name":"Ann","email":"a@b.io","role":"doctor"}"#).unwrap();
        assert_eq!(req.password, "");
        assert!(req.department.is_none());
        let new_user = NewUser::try_from(req).unwrap();
        assert_eq!(new_user.role, Role::Doctor);
    }

    #[test]
    fn unknown_role_is_a_validation_error() {
        let req = RegisterReq {
            role: "admin".into(),
            ..Default::default()
        };
        assert!(matches!(
            NewUser::try_from(req),
            Err(DomainError::Validation { .. })
        ));
    }

    #[test]
    fn login_role_defaults_to_patient() {
        let creds = Credentials::try_from(LoginReq {
            email: "a@b.io".into(),
            password: "secret1".into(),
            role: None,
        })
        .unwrap();
        assert_eq!(creds.role, Role::Patient);
    }

    #[test]
    fn login_resp_uses_expires_at_key() {
        let v = serde_json::to_value(LoginResp {
            token: "t".into(),
            role: Role::Doctor,
            name: "Dr. A".into(),
            expires_at: Utc::now(),
        })
        .unwrap();
        assert!(v.get("expiresAt").is_some());
        assert_eq!(v["role"], "doctor");
    }
}
