use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{EmployeeCode, Session};

use super::aggregate::{Totals, aggregate};
use super::types::{CargoRecord, Photo};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ShipmentStatus {
    #[default]
    Pending,
}

impl ShipmentStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
        }
    }
}

/// Frozen copy of a cargo list at the moment it was sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ShipmentSnapshot {
    pub(crate) id: String,
    pub(crate) employee_id: EmployeeCode,
    pub(crate) employee_name: String,
    pub(crate) created_at: DateTime<Utc>,
    #[serde(default)]
    pub(crate) status: ShipmentStatus,
    pub(crate) records: Vec<CargoRecord>,
    /// Photo bytes by batch id
    #[serde(default)]
    pub(crate) photos: BTreeMap<u64, Vec<Photo>>,
    pub(crate) totals: Totals,
}

impl ShipmentSnapshot {
    pub(crate) fn capture(
        session: &Session,
        records: Vec<CargoRecord>,
        photos: BTreeMap<u64, Vec<Photo>>,
        now: DateTime<Utc>,
    ) -> Self {
        let totals = aggregate(&records);
        ShipmentSnapshot {
            id: format!("SHP-{}", now.timestamp_millis()),
            employee_id: session.id.clone(),
            employee_name: session.name.clone(),
            created_at: now,
            status: ShipmentStatus::Pending,
            records,
            photos,
            totals,
        }
    }
}
