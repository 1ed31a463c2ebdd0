//! Plain-text views. Each function returns the text a command prints.

use std::fmt::Write;

use crate::model::{Appointment, Doctor, Status, UserSummary};
use crate::session::Session;

/// Which of a doctor's appointments to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DoctorFilter {
    /// Requests still awaiting a decision
    #[default]
    All,
    /// Accepted appointments
    Accepted,
}

impl DoctorFilter {
    pub fn selects(self, a: &Appointment) -> bool {
        match self {
            DoctorFilter::All => a.status == Status::Pending,
            DoctorFilter::Accepted => a.status == Status::Accepted,
        }
    }
}

pub fn registered(user: &UserSummary) -> String {
    let mut out = format!(
        "Registered Successfully: {} <{}> as {}",
        user.name, user.email, user.role
    );
    if let Some(dept) = &user.department {
        let _ = write!(out, " ({dept})");
    }
    out
}

pub fn logged_in(session: &Session) -> String {
    format!(
        "Logged in as {} ({}). Session valid until {}.",
        session.name,
        session.role,
        session.expires_at.format("%Y-%m-%d %H:%M UTC")
    )
}

pub fn whoami(session: &Session) -> String {
    format!(
        "{} ({}), session expires {}",
        session.name,
        session.role,
        session.expires_at.format("%Y-%m-%d %H:%M UTC")
    )
}

pub fn doctors(doctors: &[Doctor]) -> String {
    if doctors.is_empty() {
        return "No doctors found.".to_string();
    }
    let width = doctors.iter().map(|d| d.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for d in doctors {
        let _ = writeln!(out, "{:<width$}  {}", d.name, d.department);
    }
    out.trim_end().to_string()
}

pub fn appointment(a: &Appointment) -> String {
    format!(
        "{}  {} · {} · {} · {}  [{}]",
        a.id, a.doctor_name, a.department, a.date, a.time, a.status
    )
}

/// Patient view: own appointments with a total count.
pub fn patient_appointments(list: &[Appointment]) -> String {
    let mut out = format!("My Appointments: {} booked\n", list.len());
    if list.is_empty() {
        out.push_str("No appointments yet. Book your first appointment!");
        return out;
    }
    for a in list {
        let _ = writeln!(out, "{}", appointment(a));
    }
    out.trim_end().to_string()
}

/// Doctor view: pending requests or accepted appointments, with both counts.
pub fn doctor_appointments(list: &[Appointment], filter: DoctorFilter) -> String {
    let pending = list.iter().filter(|a| a.status == Status::Pending).count();
    let accepted = list.iter().filter(|a| a.status == Status::Accepted).count();

    let (title, empty) = match filter {
        DoctorFilter::All => ("Pending Appointment Requests", "No pending appointment requests."),
        DoctorFilter::Accepted => ("Accepted Appointments", "No accepted appointments yet."),
    };

    let mut out = format!("{title} ({pending} pending, {accepted} accepted)\n");
    let shown: Vec<&Appointment> = list.iter().filter(|a| filter.selects(a)).collect();
    if shown.is_empty() {
        out.push_str(empty);
        return out;
    }
    for a in shown {
        let _ = writeln!(
            out,
            "{}  {} · {} · {} · {}  [{}]",
            a.id, a.patient_name, a.department, a.date, a.time, a.status
        );
    }
    out.trim_end().to_string()
}
