pub mod client;
pub mod error;
pub mod model;

pub use client::AccountsApi;
pub use error::AccountsError;
pub use model::{AccessToken, Caller, Credentials, Doctor, NewUser, Role, User};
