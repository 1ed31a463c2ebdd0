// === PUBLIC CONTRACT ===
// Only the contract module (plus the route gate) is meant for other modules.
pub mod contract;

pub use contract::{client, error, model};

// === AUTH GATE ===
// Role-gating middleware consumed by other modules' routers.
pub mod gate;

// === MODULE DEFINITION ===
pub mod module;
pub use module::Accounts;
pub use config::AccountsConfig;

// === INTERNAL MODULES ===
// Exposed only for comprehensive testing; external consumers use `contract`.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
