use std::path::PathBuf;

use thiserror::Error;

use crate::model::Role;

/// Everything a client command can fail with. The `Display` text is what
/// the user sees.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("You are not logged in. Run `careflow login` first.")]
    NotLoggedIn,

    #[error("Your session has expired. Please log in again.")]
    SessionExpired,

    #[error("This command is for {required}s; you are logged in as a {actual}.")]
    WrongRole { required: Role, actual: Role },

    /// The server answered with a problem document or an error status.
    #[error("{message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Could not reach the server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response from the server: {0}")]
    Decode(String),

    #[error("Cannot access session file {path}: {source}")]
    SessionIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session file {path} is corrupt: {source}")]
    SessionFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status for server-side failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
