//! Command-line client for the CareFlow API: forms, a persisted session
//! and text views over the REST endpoints.

pub mod api;
pub mod app;
pub mod error;
pub mod forms;
pub mod model;
pub mod render;
pub mod session;

pub use api::ApiClient;
pub use app::App;
pub use error::{ClientError, ClientResult};
pub use session::{Session, SessionStore};
