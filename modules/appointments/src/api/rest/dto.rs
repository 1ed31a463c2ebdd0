use accounts::contract::model::Doctor;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{Appointment, AppointmentStatus, BookingRequest};

/// Public doctor listing entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DoctorDto {
    pub id: Uuid,
    pub name: String,
    pub department: String,
}

/// REST DTO for booking. Missing fields deserialize as empty and are
/// reported by domain validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateAppointmentReq {
    pub doctor_name: String,
    pub department: String,
    /// `YYYY-MM-DD`
    #[schema(example = "2025-03-09")]
    pub date: String,
    #[schema(example = "09:00 AM")]
    pub time: String,
    /// Optional exact doctor reference; takes precedence over `doctorName`
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateStatusReq {
    /// "accepted" or "rejected"
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDto {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub department: String,
    pub date: NaiveDate,
    pub time: String,
    #[schema(value_type = String, example = "pending")]
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Doctor> for DoctorDto {
    fn from(d: Doctor) -> Self {
        Self {
            id: d.id,
            name: d.name,
            department: d.department,
        }
    }
}

impl From<CreateAppointmentReq> for BookingRequest {
    fn from(req: CreateAppointmentReq) -> Self {
        Self {
            doctor_name: req.doctor_name,
            department: req.department,
            date: req.date,
            time: req.time,
            doctor_id: req.doctor_id,
        }
    }
}

impl From<Appointment> for AppointmentDto {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            patient_id: a.patient_id,
            patient_name: a.patient_name,
            doctor_id: a.doctor_id,
            doctor_name: a.doctor_name,
            department: a.department,
            date: a.date,
            time: a.time,
            status: a.status,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}
