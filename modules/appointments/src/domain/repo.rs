use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::{Appointment, AppointmentStatus};

/// Port for the domain layer: persistence operations the domain needs.
#[async_trait]
pub trait AppointmentsRepository: Send + Sync {
    async fn insert(&self, appointment: Appointment) -> anyhow::Result<()>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Appointment>>;

    /// Appointments booked by a patient, newest date first.
    async fn list_by_patient(&self, patient_id: Uuid) -> anyhow::Result<Vec<Appointment>>;

    /// Appointments addressed to a doctor, newest date first.
    async fn list_by_doctor(&self, doctor_id: Uuid) -> anyhow::Result<Vec<Appointment>>;

    /// Set the status. When `expected` is given the write only happens if the
    /// stored status still equals it. Returns whether a row was changed.
    async fn update_status(
        &self,
        id: Uuid,
        expected: Option<AppointmentStatus>,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;
}
