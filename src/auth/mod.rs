//! Employee sign-in: code format, directory lookup and session lifecycle

mod code;
mod directory;
mod session;

use thiserror::Error;

use crate::storage::StorageError;

pub(crate) use code::{EmployeeCode, mask_manual_input};
pub(crate) use directory::{Directory, Employee};
pub(crate) use session::{Session, SessionManager, SessionState};

#[derive(Debug, Error)]
pub(crate) enum AuthError {
    #[error("Invalid code format \"{input}\" (expected e.g. EMP001)")]
    InvalidCodeFormat { input: String },

    #[error("Employee code {code} not found")]
    UnknownEmployee { code: EmployeeCode },

    #[error("Not logged in. Run `intake login <CODE>` or `intake scan` first.")]
    NotLoggedIn,

    #[error("Session of {name} has expired, please log in again")]
    Expired { name: String },

    #[error("Failed to read roster {path}: {source}")]
    Roster {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{0}")]
    Storage(#[from] StorageError),
}
