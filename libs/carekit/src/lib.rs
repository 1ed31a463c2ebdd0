//! Shared building blocks for CareFlow modules: RFC 9457 problem responses,
//! the module capability traits the server wires together, and a traced
//! outgoing HTTP client.

pub mod api;
pub mod contracts;
pub mod http;

pub use contracts::{DbModule, RestfulModule};
