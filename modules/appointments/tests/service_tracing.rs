//! Service-layer tests over in-memory fakes, checking the emitted tracing
//! output for bookings and status changes.

use std::sync::{Arc, Mutex};

use accounts::contract::{
    client::AccountsApi,
    error::AccountsError,
    model::{Caller, Doctor, Role, User},
};
use anyhow::Result;
use appointments::contract::model::{Appointment, AppointmentStatus, BookingRequest};
use appointments::domain::error::DomainError;
use appointments::domain::repo::AppointmentsRepository;
use appointments::domain::service::{Service, ServiceConfig};
use chrono::{DateTime, Utc};
use tracing_test::traced_test;
use uuid::Uuid;

#[derive(Default)]
struct MemoryAppointments {
    rows: Mutex<Vec<Appointment>>,
}

#[async_trait::async_trait]
impl AppointmentsRepository for MemoryAppointments {
    async fn insert(&self, appointment: Appointment) -> Result<()> {
        self.rows.lock().unwrap().push(appointment);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|a| a.id == id).cloned())
    }

    async fn list_by_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn list_by_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|a| a.doctor_id == doctor_id)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: Option<AppointmentStatus>,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        if expected.is_some_and(|e| e != row.status) {
            return Ok(false);
        }
        row.status = status;
        row.updated_at = updated_at;
        Ok(true)
    }
}

/// A single cardiologist.
struct OneDoctor(Doctor);

#[async_trait::async_trait]
impl AccountsApi for OneDoctor {
    async fn get_user(&self, id: Uuid) -> Result<User, AccountsError> {
        Err(AccountsError::not_found(id))
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, AccountsError> {
        Ok(vec![self.0.clone()])
    }

    async fn find_doctors_by_name(&self, name: &str) -> Result<Vec<Doctor>, AccountsError> {
        Ok((self.0.name == name)
            .then(|| self.0.clone())
            .into_iter()
            .collect())
    }

    async fn authenticate(&self, _token: &str) -> Result<Caller, AccountsError> {
        Err(AccountsError::unauthorized("not used"))
    }
}

fn caller(name: &str, role: Role) -> Caller {
    Caller {
        user_id: Uuid::new_v4(),
        name: name.to_string(),
        role,
    }
}

fn setup() -> (Service, Caller) {
    let doctor = caller("Dr. Heart", Role::Doctor);
    let accounts = OneDoctor(Doctor {
        id: doctor.user_id,
        name: doctor.name.clone(),
        department: "Cardiology".to_string(),
    });
    let svc = Service::new(
        Arc::new(MemoryAppointments::default()),
        Arc::new(accounts),
        ServiceConfig::default(),
    );
    (svc, doctor)
}

fn booking() -> BookingRequest {
    BookingRequest {
        doctor_name: "Dr. Heart".to_string(),
        department: "Cardiology".to_string(),
        date: "2030-01-15".to_string(),
        time: "10:00 AM".to_string(),
        doctor_id: None,
    }
}

#[traced_test]
#[tokio::test]
async fn booking_logs_the_new_appointment() {
    let (svc, _) = setup();
    let patient = caller("Pat", Role::Patient);

    let appointment = svc.create_appointment(&patient, booking()).await.unwrap();

    assert!(logs_contain("Appointment booked"));
    assert!(logs_contain(&appointment.id.to_string()));
    assert!(logs_contain(&patient.user_id.to_string()));
}

#[traced_test]
#[tokio::test]
async fn decision_by_another_doctor_is_warned() {
    let (svc, _) = setup();
    let patient = caller("Pat", Role::Patient);
    let appointment = svc.create_appointment(&patient, booking()).await.unwrap();

    let stranger = caller("Dr. Other", Role::Doctor);
    let err = svc
        .update_status(&stranger, appointment.id, AppointmentStatus::Accepted)
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Forbidden { .. }));
    assert!(logs_contain("does not own the appointment"));
    assert!(!logs_contain("Appointment status updated"));
}

#[traced_test]
#[tokio::test]
async fn accepted_appointment_logs_status_change() {
    let (svc, doctor) = setup();
    let patient = caller("Pat", Role::Patient);
    let appointment = svc.create_appointment(&patient, booking()).await.unwrap();

    let updated = svc
        .update_status(&doctor, appointment.id, AppointmentStatus::Accepted)
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Accepted);
    assert!(logs_contain("Appointment status updated"));
    assert!(logs_contain(&appointment.id.to_string()));
}
