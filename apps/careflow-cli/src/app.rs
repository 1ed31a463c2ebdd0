use tracing::{info, warn};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::forms::{self, BookingForm, LoginForm, RegisterForm};
use crate::model::{Role, Status};
use crate::render::{self, DoctorFilter};
use crate::session::{Session, SessionStore};

/// Client commands. Each returns the text to print.
pub struct App {
    api: ApiClient,
    sessions: SessionStore,
}

impl App {
    pub fn new(api: ApiClient, sessions: SessionStore) -> Self {
        Self { api, sessions }
    }

    pub async fn register(&self, form: RegisterForm) -> ClientResult<String> {
        let req = form.validate()?;
        let user = self.api.register(&req).await?;
        info!(user_id = %user.id, role = %user.role, "Registered");
        Ok(render::registered(&user))
    }

    pub async fn login(&self, form: LoginForm) -> ClientResult<String> {
        let req = form.validate()?;
        let resp = self.api.login(&req).await?;
        if resp.role != req.role {
            return Err(ClientError::validation(
                "Selected role does not match your account.",
            ));
        }
        let session = Session::from(resp);
        self.sessions.save(&session)?;
        Ok(render::logged_in(&session))
    }

    pub fn logout(&self) -> ClientResult<String> {
        Ok(if self.sessions.clear()? {
            "Logged out.".to_string()
        } else {
            "You were not logged in.".to_string()
        })
    }

    pub fn whoami(&self) -> ClientResult<String> {
        let session = self.sessions.require(None)?;
        Ok(render::whoami(&session))
    }

    pub async fn doctors(&self, department: Option<&str>) -> ClientResult<String> {
        let all = self.api.doctors().await?;
        let shown = match department {
            Some(raw) => {
                let dept = forms::pick_department(raw)?;
                forms::doctors_in(&all, dept).into_iter().cloned().collect()
            }
            None => all,
        };
        Ok(render::doctors(&shown))
    }

    pub async fn book(&self, form: BookingForm) -> ClientResult<String> {
        let session = self.sessions.require(Some(Role::Patient))?;
        let doctors = self.api.doctors().await?;
        let req = form.validate(&doctors)?;
        let booked = self
            .api
            .book(&session, &req)
            .await
            .map_err(|e| self.forget_if_unauthorized(e))?;
        Ok(format!(
            "Appointment booked successfully! The doctor will review your request.\n{}",
            render::appointment(&booked)
        ))
    }

    pub async fn my_appointments(&self) -> ClientResult<String> {
        let session = self.sessions.require(Some(Role::Patient))?;
        let list = self
            .api
            .my_appointments(&session)
            .await
            .map_err(|e| self.forget_if_unauthorized(e))?;
        Ok(render::patient_appointments(&list))
    }

    pub async fn requests(&self, filter: DoctorFilter) -> ClientResult<String> {
        let session = self.sessions.require(Some(Role::Doctor))?;
        let list = self
            .api
            .doctor_appointments(&session)
            .await
            .map_err(|e| self.forget_if_unauthorized(e))?;
        Ok(render::doctor_appointments(&list, filter))
    }

    /// Accept or reject one of the caller's pending requests.
    pub async fn decide(&self, id: Uuid, status: Status) -> ClientResult<String> {
        let session = self.sessions.require(Some(Role::Doctor))?;
        let list = self
            .api
            .doctor_appointments(&session)
            .await
            .map_err(|e| self.forget_if_unauthorized(e))?;

        let current = list
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| ClientError::validation(format!("No appointment {id} among your requests.")))?;
        if current.status != Status::Pending {
            return Err(ClientError::validation(format!(
                "Appointment {id} is already {}.",
                current.status
            )));
        }

        let updated = self
            .api
            .update_status(&session, id, status)
            .await
            .map_err(|e| self.forget_if_unauthorized(e))?;
        Ok(format!(
            "Appointment {}.\n{}",
            updated.status,
            render::appointment(&updated)
        ))
    }

    /// A token the server no longer accepts is useless; drop it.
    fn forget_if_unauthorized(&self, err: ClientError) -> ClientError {
        if err.status() == Some(401) {
            if let Err(e) = self.sessions.clear() {
                warn!(error = %e, "Could not remove rejected session");
            }
            return ClientError::SessionExpired;
        }
        err
    }
}
