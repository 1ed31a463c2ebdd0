use serde::{Deserialize, Serialize};

/// Configuration for the appointments module.
///
/// Turning both switches off restores the permissive legacy behaviour where
/// any doctor may set any status on any appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppointmentsConfig {
    /// Only the appointment's own doctor may change its status.
    #[serde(default = "default_true")]
    pub enforce_doctor_ownership: bool,
    /// Status may only move from pending to accepted or rejected.
    #[serde(default = "default_true")]
    pub enforce_pending_transitions: bool,
}

impl Default for AppointmentsConfig {
    fn default() -> Self {
        Self {
            enforce_doctor_ownership: true,
            enforce_pending_transitions: true,
        }
    }
}

fn default_true() -> bool {
    true
}
