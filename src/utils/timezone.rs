//! Display zone for record, shipment and session timestamps

use std::str::FromStr;

use chrono::offset::Offset;
use chrono::{DateTime, FixedOffset, Local, Utc};
use chrono_tz::Tz;

use crate::consts::DATETIME_FORMAT;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Timezone {
    Local,
    Named(Tz),
    /// Bare offset such as `+03:00`, for hosts without a zone database entry
    Fixed(FixedOffset),
}

impl Timezone {
    pub(crate) fn parse(value: Option<&str>) -> Result<Self, AppError> {
        let raw = value.map(str::trim).unwrap_or_default();
        if raw.is_empty() || raw.eq_ignore_ascii_case("local") {
            return Ok(Timezone::Local);
        }
        if raw.eq_ignore_ascii_case("utc") || raw.eq_ignore_ascii_case("z") {
            return Ok(Timezone::Named(chrono_tz::UTC));
        }
        if raw.starts_with(['+', '-']) {
            return FixedOffset::from_str(raw)
                .map(Timezone::Fixed)
                .map_err(|_| AppError::InvalidTimezone {
                    input: raw.to_string(),
                });
        }
        Tz::from_str(raw)
            .map(Timezone::Named)
            .map_err(|_| AppError::InvalidTimezone {
                input: raw.to_string(),
            })
    }

    pub(crate) fn offset_at(self, utc: DateTime<Utc>) -> FixedOffset {
        match self {
            Timezone::Local => utc.with_timezone(&Local).offset().fix(),
            Timezone::Named(tz) => utc.with_timezone(&tz).offset().fix(),
            Timezone::Fixed(offset) => offset,
        }
    }

    /// Wall-clock rendering used by every table
    pub(crate) fn stamp(self, utc: DateTime<Utc>) -> String {
        utc.with_timezone(&self.offset_at(utc))
            .format(DATETIME_FORMAT)
            .to_string()
    }
}
