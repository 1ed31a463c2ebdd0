use anyhow::Context;
use sea_orm::Set;

use crate::contract::model::{Role, User};
use crate::domain::repo::UserRecord;
use crate::infra::storage::entity::{ActiveModel, Model};

impl TryFrom<Model> for UserRecord {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let role: Role = m
            .role
            .parse()
            .with_context(|| format!("stored user {} has a bad role", m.id))?;
        Ok(UserRecord {
            user: User {
                id: m.id,
                name: m.name,
                email: m.email,
                role,
                department: m.department,
                created_at: m.created_at,
            },
            password_hash: m.password_hash,
        })
    }
}

impl TryFrom<Model> for User {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        UserRecord::try_from(m).map(|r| r.user)
    }
}

impl From<UserRecord> for ActiveModel {
    fn from(r: UserRecord) -> Self {
        ActiveModel {
            id: Set(r.user.id),
            name: Set(r.user.name),
            email: Set(r.user.email),
            password_hash: Set(r.password_hash),
            role: Set(r.user.role.as_str().to_string()),
            department: Set(r.user.department),
            created_at: Set(r.user.created_at),
        }
    }
}
