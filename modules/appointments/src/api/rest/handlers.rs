use std::sync::Arc;

use accounts::contract::model::Caller;
use axum::{
    extract::Path,
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use carekit::api::{
    problem::{Problem, ProblemResponse},
    JsonBody,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::api::rest::dto::{AppointmentDto, CreateAppointmentReq, DoctorDto, UpdateStatusReq};
use crate::api::rest::error::map_domain_error;
use crate::contract::model::AppointmentStatus;
use crate::domain::error::DomainError;
use crate::domain::service::Service;

/// List all doctors with their departments
#[utoipa::path(
    get,
    path = "/api/doctors",
    tag = "appointments",
    responses(
        (status = 200, description = "Doctors ordered by name", body = [DoctorDto]),
        (status = 500, description = "Internal Server Error", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn list_doctors(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
) -> Result<Json<Vec<DoctorDto>>, ProblemResponse> {
    match svc.list_doctors().await {
        Ok(doctors) => Ok(Json(doctors.into_iter().map(DoctorDto::from).collect())),
        Err(e) => {
            error!("Failed to list doctors: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Book an appointment as the calling patient
#[utoipa::path(
    post,
    path = "/api/appointment",
    tag = "appointments",
    request_body = CreateAppointmentReq,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Appointment created as pending", body = AppointmentDto),
        (status = 400, description = "Validation error", body = Problem, content_type = "application/problem+json"),
        (status = 401, description = "Missing or invalid token", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Caller is not a patient", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn create_appointment(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Extension(caller): Extension<Caller>,
    JsonBody(req_body): JsonBody<CreateAppointmentReq>,
) -> Result<(StatusCode, Json<AppointmentDto>), ProblemResponse> {
    info!(patient_id = %caller.user_id, "Booking request: {:?}", req_body);

    match svc.create_appointment(&caller, req_body.into()).await {
        Ok(appointment) => Ok((StatusCode::CREATED, Json(AppointmentDto::from(appointment)))),
        Err(e) => {
            log_failure("create appointment", &e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Appointments booked by the calling patient, newest first
#[utoipa::path(
    get,
    path = "/api/my-appointments",
    tag = "appointments",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller's appointments", body = [AppointmentDto]),
        (status = 401, description = "Missing or invalid token", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Caller is not a patient", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn list_my_appointments(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<AppointmentDto>>, ProblemResponse> {
    match svc.list_my_appointments(&caller).await {
        Ok(list) => Ok(Json(list.into_iter().map(AppointmentDto::from).collect())),
        Err(e) => {
            log_failure("list patient appointments", &e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Appointments addressed to the calling doctor, newest first
#[utoipa::path(
    get,
    path = "/api/doctor-appointments",
    tag = "appointments",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller's appointment requests", body = [AppointmentDto]),
        (status = 401, description = "Missing or invalid token", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Caller is not a doctor", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn list_doctor_appointments(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<AppointmentDto>>, ProblemResponse> {
    match svc.list_doctor_appointments(&caller).await {
        Ok(list) => Ok(Json(list.into_iter().map(AppointmentDto::from).collect())),
        Err(e) => {
            log_failure("list doctor appointments", &e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Accept or reject an appointment
#[utoipa::path(
    put,
    path = "/api/appointment/{id}",
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment UUID")),
    request_body = UpdateStatusReq,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated appointment", body = AppointmentDto),
        (status = 400, description = "Validation error", body = Problem, content_type = "application/problem+json"),
        (status = 401, description = "Missing or invalid token", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Caller is not the appointment's doctor", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Appointment already decided", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn update_status(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    JsonBody(req_body): JsonBody<UpdateStatusReq>,
) -> Result<Json<AppointmentDto>, ProblemResponse> {
    info!(doctor_id = %caller.user_id, appointment_id = %id, status = %req_body.status, "Status update request");

    let result = match parse_update(&id, &req_body.status) {
        Ok((id, status)) => svc.update_status(&caller, id, status).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(appointment) => Ok(Json(AppointmentDto::from(appointment))),
        Err(e) => {
            log_failure("update appointment status", &e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

fn parse_update(id: &str, status: &str) -> Result<(Uuid, AppointmentStatus), DomainError> {
    let id = Uuid::parse_str(id.trim())
        .map_err(|_| DomainError::validation("id", format!("'{id}' is not a valid appointment id")))?;
    let status = status
        .parse()
        .map_err(|e: crate::contract::model::UnknownStatus| DomainError::validation("status", e.to_string()))?;
    Ok((id, status))
}

fn log_failure(op: &str, e: &DomainError) {
    match e {
        DomainError::Database { .. } | DomainError::Accounts { .. } => {
            error!("Failed to {op}: {e}")
        }
        _ => info!("Rejected {op}: {e}"),
    }
}
