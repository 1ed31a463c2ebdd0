use std::sync::Arc;

use accounts::{contract::model::Role, gate::AuthGate};
use axum::{
    routing::{get, post, put},
    Extension, Router,
};
use carekit::api::problem::{FieldError, Problem};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_doctors,
        handlers::create_appointment,
        handlers::list_my_appointments,
        handlers::list_doctor_appointments,
        handlers::update_status
    ),
    components(schemas(
        dto::DoctorDto,
        dto::CreateAppointmentReq,
        dto::UpdateStatusReq,
        dto::AppointmentDto,
        Problem,
        FieldError
    )),
    modifiers(&BearerAuth),
    tags((name = "appointments", description = "Booking and the appointment lifecycle"))
)]
pub struct AppointmentsApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn register_routes(
    router: Router,
    service: Arc<Service>,
    gate: &AuthGate,
) -> anyhow::Result<Router> {
    // GET /api/doctors - Public doctor directory
    let public = Router::new().route("/api/doctors", get(handlers::list_doctors));

    // POST /api/appointment - Book (patient)
    // GET /api/my-appointments - Own bookings (patient)
    let patient = gate.protect(
        Router::new()
            .route("/api/appointment", post(handlers::create_appointment))
            .route("/api/my-appointments", get(handlers::list_my_appointments)),
        &[Role::Patient],
    );

    // GET /api/doctor-appointments - Incoming requests (doctor)
    // PUT /api/appointment/{id} - Accept or reject (doctor)
    let doctor = gate.protect(
        Router::new()
            .route(
                "/api/doctor-appointments",
                get(handlers::list_doctor_appointments),
            )
            .route("/api/appointment/{id}", put(handlers::update_status)),
        &[Role::Doctor],
    );

    let appointments = public
        .merge(patient)
        .merge(doctor)
        .layer(Extension(service));

    Ok(router.merge(appointments))
}
