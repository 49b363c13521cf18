//! Cargo record model and input validation

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::EmployeeCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum CargoType {
    EuroPallet,
    AmericanPallet,
    Box,
    NonStandard,
}

impl CargoType {
    pub(crate) const ALL: [CargoType; 4] = [
        CargoType::EuroPallet,
        CargoType::AmericanPallet,
        CargoType::Box,
        CargoType::NonStandard,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            CargoType::EuroPallet => "euro-pallet",
            CargoType::AmericanPallet => "american-pallet",
            CargoType::Box => "box",
            CargoType::NonStandard => "non-standard",
        }
    }

    /// Preset form values when a type is picked
    pub(crate) fn default_dimensions(self) -> Dimensions {
        let (length, width, height) = match self {
            CargoType::EuroPallet => (120, 80, 30),
            CargoType::AmericanPallet => (120, 100, 30),
            CargoType::Box => (60, 40, 40),
            CargoType::NonStandard => (100, 100, 100),
        };
        Dimensions {
            length,
            width,
            height,
        }
    }
}

impl fmt::Display for CargoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown {what} \"{input}\" (expected one of: {expected})")]
pub(crate) struct ParseKindError {
    what: &'static str,
    input: String,
    expected: String,
}

impl FromStr for CargoType {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        CargoType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ParseKindError {
                what: "cargo type",
                input: s.to_string(),
                expected: CargoType::ALL.map(CargoType::as_str).join(", "),
            })
    }
}

/// Outer size in whole centimeters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Dimensions {
    pub(crate) length: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl Dimensions {
    /// Cubic meters
    pub(crate) fn volume_m3(&self) -> f64 {
        f64::from(self.length) * f64::from(self.width) * f64::from(self.height) / 1_000_000.0
    }

    fn axes(&self) -> [(&'static str, u32); 3] {
        [
            ("length", self.length),
            ("width", self.width),
            ("height", self.height),
        ]
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.length, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum PackagingKind {
    #[default]
    None,
    Crate,
    PalletRail,
}

impl PackagingKind {
    const ALL: [PackagingKind; 3] = [
        PackagingKind::None,
        PackagingKind::Crate,
        PackagingKind::PalletRail,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            PackagingKind::None => "none",
            PackagingKind::Crate => "crate",
            PackagingKind::PalletRail => "pallet-rail",
        }
    }
}

impl FromStr for PackagingKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PackagingKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| ParseKindError {
                what: "packaging",
                input: s.to_string(),
                expected: PackagingKind::ALL.map(PackagingKind::as_str).join(", "),
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Packaging {
    pub(crate) kind: PackagingKind,
    pub(crate) count: u32,
}

impl Packaging {
    /// No packaging never carries a count
    pub(crate) fn new(kind: PackagingKind, count: u32) -> Self {
        let count = if kind == PackagingKind::None { 0 } else { count };
        Packaging { kind, count }
    }
}

impl fmt::Display for Packaging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.count)
    }
}

/// Opaque image attached to a batch. Bytes are stored as base64 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Photo {
    pub(crate) name: String,
    #[serde(with = "base64_bytes")]
    pub(crate) data: Vec<u8>,
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}

/// Form values for one "save" action
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CargoInput {
    pub(crate) cargo_type: CargoType,
    pub(crate) dimensions: Dimensions,
    /// Total weight of all `quantity` units, kg
    pub(crate) weight: f64,
    pub(crate) quantity: u32,
    pub(crate) packaging: Packaging,
    pub(crate) photos: Vec<Photo>,
}

impl CargoInput {
    /// Form defaults for a type: preset size, 1 kg, one unit
    pub(crate) fn for_type(cargo_type: CargoType) -> Self {
        CargoInput {
            cargo_type,
            dimensions: cargo_type.default_dimensions(),
            weight: 1.0,
            quantity: 1,
            packaging: Packaging::default(),
            photos: Vec::new(),
        }
    }
}

/// One physical unit in the session list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CargoRecord {
    pub(crate) id: u64,
    pub(crate) cargo_type: CargoType,
    #[serde(flatten)]
    pub(crate) dimensions: Dimensions,
    /// Per-unit weight, kg
    pub(crate) weight: f64,
    /// Per-unit volume, m³
    pub(crate) volume: f64,
    #[serde(default)]
    pub(crate) packaging: Packaging,
    /// Photo names; the bytes are kept once per batch by the store
    #[serde(default)]
    pub(crate) photos: Vec<String>,
    pub(crate) quantity: u32,
    pub(crate) batch_quantity: u32,
    /// Id of the first unit created by the same add
    #[serde(default)]
    pub(crate) batch_id: u64,
    pub(crate) group_key: String,
    pub(crate) employee_id: EmployeeCode,
    pub(crate) timestamp: DateTime<Utc>,
}

/// Signature shared by records of identical kind
pub(crate) fn group_key(
    cargo_type: CargoType,
    dimensions: Dimensions,
    unit_weight: f64,
    packaging: Packaging,
    batch_quantity: u32,
    photo_count: usize,
) -> String {
    format!("{cargo_type}|{dimensions}|{unit_weight}|{packaging}|{batch_quantity}|{photo_count}")
}

/// Bounds applied to every add
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Limits {
    pub(crate) dimension_min: u32,
    pub(crate) dimension_max: u32,
    pub(crate) weight_min: f64,
    pub(crate) weight_max: f64,
    pub(crate) max_quantity: u32,
    pub(crate) max_photo_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            dimension_min: 10,
            dimension_max: 1000,
            weight_min: 1.0,
            weight_max: 10_000.0,
            max_quantity: 100,
            max_photo_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum ValidationError {
    #[error("Quantity {value} is out of range (1..={max})")]
    Quantity { value: u32, max: u32 },

    #[error("Weight {value} kg is out of range ({min}..={max} kg)")]
    Weight { value: f64, min: f64, max: f64 },

    #[error("Photo {name} is {size} bytes, the limit is {max}")]
    PhotoTooLarge { name: String, size: usize, max: usize },

    #[error("{axis} {value} cm is out of range ({min}..={max} cm)")]
    Dimension {
        axis: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

impl Limits {
    pub(crate) fn validate(&self, input: &CargoInput) -> Result<(), ValidationError> {
        if input.quantity == 0 || input.quantity > self.max_quantity {
            return Err(ValidationError::Quantity {
                value: input.quantity,
                max: self.max_quantity,
            });
        }

        let w = input.weight;
        if !w.is_finite() || w <= 0.0 || w < self.weight_min || w > self.weight_max {
            return Err(ValidationError::Weight {
                value: w,
                min: self.weight_min,
                max: self.weight_max,
            });
        }

        for (axis, value) in input.dimensions.axes() {
            if value < self.dimension_min || value > self.dimension_max {
                return Err(ValidationError::Dimension {
                    axis,
                    value,
                    min: self.dimension_min,
                    max: self.dimension_max,
                });
            }
        }

        if let Some(photo) = input.photos.iter().find(|p| p.data.len() > self.max_photo_bytes) {
            return Err(ValidationError::PhotoTooLarge {
                name: photo.name.clone(),
                size: photo.data.len(),
                max: self.max_photo_bytes,
            });
        }

        Ok(())
    }
}
