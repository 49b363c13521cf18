use thiserror::Error;

use crate::auth::AuthError;
use crate::cargo::{CargoError, ParseKindError};
use crate::qr::PayloadKind;
use crate::storage::StorageError;
use crate::utils::JqError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Invalid timezone: {input}")]
    InvalidTimezone { input: String },

    #[error("Unsupported locale: {input}")]
    UnsupportedLocale { input: String },

    #[error("No employee code found in {kind}")]
    NoCodeFound { kind: PayloadKind },

    #[error("Scanner input ended without a recognized employee code")]
    ScanExhausted,

    #[error("Failed to read photo {path}: {source}")]
    Photo {
        path: String,
        source: std::io::Error,
    },

    #[error("{0}")]
    InvalidValue(#[from] ParseKindError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Cargo(#[from] CargoError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Jq(#[from] JqError),
}
