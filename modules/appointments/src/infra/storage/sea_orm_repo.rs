//! SeaORM-backed repository implementation for the domain port.

use anyhow::Context;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Select,
};
use uuid::Uuid;

use crate::contract::model::{Appointment, AppointmentStatus};
use crate::domain::repo::AppointmentsRepository;
use crate::infra::storage::entity::{
    ActiveModel as AppointmentAM, Column, Entity as AppointmentEntity,
};

pub struct SeaOrmAppointmentsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmAppointmentsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    async fn list(&self, query: Select<AppointmentEntity>) -> anyhow::Result<Vec<Appointment>> {
        let rows = query
            .order_by_desc(Column::Date)
            .order_by_desc(Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("list appointments failed")?;
        rows.into_iter().map(Appointment::try_from).collect()
    }
}

#[async_trait::async_trait]
impl<C> AppointmentsRepository for SeaOrmAppointmentsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn insert(&self, appointment: Appointment) -> anyhow::Result<()> {
        let m: AppointmentAM = appointment.into();
        let _ = m.insert(&self.conn).await.context("insert failed")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Appointment>> {
        let found = AppointmentEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        found.map(Appointment::try_from).transpose()
    }

    async fn list_by_patient(&self, patient_id: Uuid) -> anyhow::Result<Vec<Appointment>> {
        self.list(AppointmentEntity::find().filter(Column::PatientId.eq(patient_id)))
            .await
    }

    async fn list_by_doctor(&self, doctor_id: Uuid) -> anyhow::Result<Vec<Appointment>> {
        self.list(AppointmentEntity::find().filter(Column::DoctorId.eq(doctor_id)))
            .await
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: Option<AppointmentStatus>,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let mut update = AppointmentEntity::update_many()
            .col_expr(Column::Status, Expr::value(status.as_str()))
            .col_expr(Column::UpdatedAt, Expr::value(updated_at))
            .filter(Column::Id.eq(id));
        if let Some(expected) = expected {
            update = update.filter(Column::Status.eq(expected.as_str()));
        }
        let res = update
            .exec(&self.conn)
            .await
            .context("update_status failed")?;
        Ok(res.rows_affected > 0)
    }
}
