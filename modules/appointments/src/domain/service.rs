use std::sync::Arc;

use accounts::contract::{
    client::AccountsApi,
    model::{Caller, Doctor, Role},
};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{Appointment, AppointmentStatus, BookingRequest};
use crate::domain::error::DomainError;
use crate::domain::repo::AppointmentsRepository;

/// Domain service: booking and the appointment lifecycle, scoped by caller.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn AppointmentsRepository>,
    accounts: Arc<dyn AccountsApi>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub enforce_doctor_ownership: bool,
    pub enforce_pending_transitions: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            enforce_doctor_ownership: true,
            enforce_pending_transitions: true,
        }
    }
}

impl Service {
    pub fn new(
        repo: Arc<dyn AppointmentsRepository>,
        accounts: Arc<dyn AccountsApi>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            accounts,
            config,
        }
    }

    #[instrument(name = "appointments.service.list_doctors", skip(self))]
    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DomainError> {
        let doctors = self.accounts.list_doctors().await?;
        debug!("Found {} doctors", doctors.len());
        Ok(doctors)
    }

    #[instrument(
        name = "appointments.service.create_appointment",
        skip(self, caller, request),
        fields(patient_id = %caller.user_id, doctor = %request.doctor_name)
    )]
    pub async fn create_appointment(
        &self,
        caller: &Caller,
        request: BookingRequest,
    ) -> Result<Appointment, DomainError> {
        require_role(caller, Role::Patient)?;

        let department = request.department.trim();
        let time = request.time.trim();
        if department.is_empty() {
            return Err(DomainError::validation("department", "Department is required"));
        }
        if time.is_empty() {
            return Err(DomainError::validation("time", "Time is required"));
        }
        let date = parse_date(&request.date)?;

        let doctor = self
            .resolve_doctor(request.doctor_id, request.doctor_name.trim(), department)
            .await?;

        if !doctor.department.eq_ignore_ascii_case(department) {
            return Err(DomainError::DepartmentMismatch {
                doctor: doctor.name,
                actual: doctor.department,
                requested: department.to_string(),
            });
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: caller.user_id,
            patient_name: caller.name.clone(),
            doctor_id: doctor.id,
            doctor_name: doctor.name,
            department: doctor.department,
            date,
            time: time.to_string(),
            status: AppointmentStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.repo
            .insert(appointment.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        info!(appointment_id = %appointment.id, doctor_id = %appointment.doctor_id, "Appointment booked");
        Ok(appointment)
    }

    #[instrument(
        name = "appointments.service.list_my_appointments",
        skip(self, caller),
        fields(patient_id = %caller.user_id)
    )]
    pub async fn list_my_appointments(
        &self,
        caller: &Caller,
    ) -> Result<Vec<Appointment>, DomainError> {
        require_role(caller, Role::Patient)?;
        self.repo
            .list_by_patient(caller.user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    #[instrument(
        name = "appointments.service.list_doctor_appointments",
        skip(self, caller),
        fields(doctor_id = %caller.user_id)
    )]
    pub async fn list_doctor_appointments(
        &self,
        caller: &Caller,
    ) -> Result<Vec<Appointment>, DomainError> {
        require_role(caller, Role::Doctor)?;
        self.repo
            .list_by_doctor(caller.user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    #[instrument(
        name = "appointments.service.update_status",
        skip(self, caller, id, status),
        fields(doctor_id = %caller.user_id, appointment_id = %id, status = %status)
    )]
    pub async fn update_status(
        &self,
        caller: &Caller,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, DomainError> {
        require_role(caller, Role::Doctor)?;

        let current = self.load(id).await?;

        if self.config.enforce_doctor_ownership && current.doctor_id != caller.user_id {
            warn!(owner = %current.doctor_id, "Status change by a doctor who does not own the appointment");
            return Err(DomainError::forbidden(
                "Only the assigned doctor can update this appointment",
            ));
        }

        let expected = if self.config.enforce_pending_transitions {
            check_transition(current.status, status)?;
            Some(AppointmentStatus::Pending)
        } else {
            None
        };

        let changed = self
            .repo
            .update_status(id, expected, status, Utc::now())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let updated = self.load(id).await?;
        if !changed {
            // Someone else decided first.
            return Err(DomainError::InvalidTransition {
                from: updated.status,
                to: status,
            });
        }

        info!(from = %current.status, "Appointment status updated");
        Ok(updated)
    }

    async fn load(&self, id: Uuid) -> Result<Appointment, DomainError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::appointment_not_found(id))
    }

    /// Pick the doctor a booking refers to: by id when given, otherwise by
    /// exact name, narrowed by department when the name is shared.
    async fn resolve_doctor(
        &self,
        doctor_id: Option<Uuid>,
        name: &str,
        department: &str,
    ) -> Result<Doctor, DomainError> {
        if let Some(id) = doctor_id {
            let user = self.accounts.get_user(id).await?;
            if user.role != Role::Doctor {
                return Err(DomainError::doctor_not_found(id.to_string()));
            }
            return Ok(Doctor {
                id: user.id,
                name: user.name,
                department: user.department.unwrap_or_default(),
            });
        }

        if name.is_empty() {
            return Err(DomainError::validation("doctorName", "Doctor name is required"));
        }

        let mut candidates = self.accounts.find_doctors_by_name(name).await?;
        match candidates.len() {
            0 => Err(DomainError::doctor_not_found(name)),
            1 => Ok(candidates.remove(0)),
            count => {
                let mut in_department: Vec<Doctor> = candidates
                    .into_iter()
                    .filter(|d| d.department.eq_ignore_ascii_case(department))
                    .collect();
                match in_department.len() {
                    1 => Ok(in_department.remove(0)),
                    _ => Err(DomainError::AmbiguousDoctor {
                        name: name.to_string(),
                        count,
                    }),
                }
            }
        }
    }
}

fn require_role(caller: &Caller, role: Role) -> Result<(), DomainError> {
    if caller.role != role {
        return Err(DomainError::forbidden(format!(
            "This action requires the {role} role"
        )));
    }
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate, DomainError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DomainError::validation("date", "Date is required"));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| DomainError::validation("date", format!("'{raw}' is not a YYYY-MM-DD date")))
}

/// Forward-only lifecycle: pending may become accepted or rejected, nothing else.
fn check_transition(from: AppointmentStatus, to: AppointmentStatus) -> Result<(), DomainError> {
    match (from, to) {
        (AppointmentStatus::Pending, AppointmentStatus::Accepted | AppointmentStatus::Rejected) => {
            Ok(())
        }
        _ => Err(DomainError::InvalidTransition { from, to }),
    }
}
