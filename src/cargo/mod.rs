//! Cargo intake: record model, validation, the live list and shipments

mod aggregate;
mod shipment;
mod store;
mod types;

use thiserror::Error;

use crate::storage::StorageError;

pub(crate) use aggregate::{GroupSummary, Totals};
pub(crate) use shipment::ShipmentSnapshot;
pub(crate) use store::{CargoStore, Phase};
pub(crate) use types::{
    CargoInput, CargoRecord, CargoType, Limits, Packaging, PackagingKind, ParseKindError, Photo,
    ValidationError,
};

#[derive(Debug, Error)]
pub(crate) enum CargoError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Cargo list changed but could not be saved: {0}")]
    Persistence(StorageError),

    #[error("Shipment was not sent: {0}")]
    SendFailed(StorageError),

    #[error("Failed to encode cargo data: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Nothing to send: the cargo list is empty")]
    EmptyShipment,
}

impl CargoError {
    /// Storage failures may succeed on a later attempt
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self, CargoError::Persistence(_) | CargoError::SendFailed(_))
    }
}
