use anyhow::Context;
use sea_orm::Set;

use crate::contract::model::Appointment;
use crate::infra::storage::entity::{ActiveModel, Model};

impl TryFrom<Model> for Appointment {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let status = m
            .status
            .parse()
            .with_context(|| format!("stored appointment {} has a bad status", m.id))?;
        Ok(Appointment {
            id: m.id,
            patient_id: m.patient_id,
            patient_name: m.patient_name,
            doctor_id: m.doctor_id,
            doctor_name: m.doctor_name,
            department: m.department,
            date: m.date,
            time: m.time,
            status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

impl From<Appointment> for ActiveModel {
    fn from(a: Appointment) -> Self {
        ActiveModel {
            id: Set(a.id),
            patient_id: Set(a.patient_id),
            patient_name: Set(a.patient_name),
            doctor_id: Set(a.doctor_id),
            doctor_name: Set(a.doctor_name),
            department: Set(a.department),
            date: Set(a.date),
            time: Set(a.time),
            status: Set(a.status.as_str().to_string()),
            created_at: Set(a.created_at),
            updated_at: Set(a.updated_at),
        }
    }
}
