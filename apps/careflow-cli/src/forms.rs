//! Client-side form validation. The server validates again; these checks
//! give the user the same messages the web forms did, before any request.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ClientError, ClientResult};
use crate::model::{BookingRequest, Doctor, LoginRequest, RegisterRequest, Role};

pub const DEPARTMENTS: [&str; 6] = [
    "Cardiology",
    "Dermatology",
    "Orthopedics",
    "Neurology",
    "Pediatrics",
    "General Medicine",
];

pub const TIME_SLOTS: [&str; 6] = [
    "09:00 AM", "10:30 AM", "12:00 PM", "02:00 PM", "04:30 PM", "06:00 PM",
];

pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("static email pattern"));

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub department: Option<String>,
}

impl RegisterForm {
    pub fn validate(self) -> ClientResult<RegisterRequest> {
        let name = self.name.trim();
        let email = self.email.trim();
        let password = self.password.trim();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ClientError::validation("All fields are required."));
        }
        check_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ClientError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters."
            )));
        }

        let role = self.role.unwrap_or(Role::Patient);
        let department = match role {
            Role::Doctor => {
                let raw = self.department.as_deref().map(str::trim).unwrap_or("");
                if raw.is_empty() {
                    return Err(ClientError::validation("Department is required for doctors."));
                }
                Some(pick_department(raw)?.to_string())
            }
            Role::Patient => None,
        };

        Ok(RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
            department,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

impl LoginForm {
    pub fn validate(self) -> ClientResult<LoginRequest> {
        let email = self.email.trim();
        let password = self.password.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ClientError::validation("Email and password are required."));
        }
        check_email(email)?;
        Ok(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            role: self.role.unwrap_or(Role::Patient),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookingForm {
    pub department: String,
    pub doctor_name: String,
    pub date: String,
    pub time: String,
}

impl BookingForm {
    /// Validate against the fixed lists and the doctors known for the
    /// department. The request names the doctor by id as well as by name.
    pub fn validate(self, doctors: &[Doctor]) -> ClientResult<BookingRequest> {
        let department = self.department.trim();
        if department.is_empty() {
            return Err(ClientError::validation("Please select a department."));
        }
        let department = pick_department(department)?;

        let doctor_name = self.doctor_name.trim();
        if doctor_name.is_empty() {
            return Err(ClientError::validation("Please select a doctor."));
        }
        let in_department = doctors_in(doctors, department);
        let doctor = in_department
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(doctor_name))
            .ok_or_else(|| {
                let names: Vec<&str> = in_department.iter().map(|d| d.name.as_str()).collect();
                let hint = if names.is_empty() {
                    "there are no doctors in this department yet".to_string()
                } else {
                    format!("choose one of: {}", names.join(", "))
                };
                ClientError::validation(format!(
                    "No doctor named '{doctor_name}' in {department}; {hint}."
                ))
            })?;

        let date = self.date.trim();
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(ClientError::validation(
                "Please enter the date as YYYY-MM-DD.",
            ));
        }

        let time = pick_time_slot(self.time.trim())?;

        Ok(BookingRequest {
            doctor_name: doctor.name.clone(),
            department: department.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            doctor_id: Some(doctor.id),
        })
    }
}

/// Doctors whose department is exactly `department`.
pub fn doctors_in<'a>(doctors: &'a [Doctor], department: &str) -> Vec<&'a Doctor> {
    doctors.iter().filter(|d| d.department == department).collect()
}

fn check_email(email: &str) -> ClientResult<()> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ClientError::validation("Please enter a valid email address."))
    }
}

/// Canonical spelling of a department from the fixed list.
pub fn pick_department(raw: &str) -> ClientResult<&'static str> {
    DEPARTMENTS
        .iter()
        .copied()
        .find(|d| d.eq_ignore_ascii_case(raw.trim()))
        .ok_or_else(|| {
            ClientError::validation(format!(
                "Unknown department '{}'. Choose one of: {}.",
                raw.trim(),
                DEPARTMENTS.join(", ")
            ))
        })
}

fn pick_time_slot(raw: &str) -> ClientResult<&'static str> {
    if raw.is_empty() {
        return Err(ClientError::validation("Please select a time."));
    }
    TIME_SLOTS
        .iter()
        .copied()
        .find(|t| t.eq_ignore_ascii_case(raw))
        .ok_or_else(|| {
            ClientError::validation(format!(
                "Unknown time slot '{raw}'. Choose one of: {}.",
                TIME_SLOTS.join(", ")
            ))
        })
}
