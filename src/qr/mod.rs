//! QR payload interpretation and the scan loop around it

mod describe;
mod guard;
mod scan;
mod strategy;

pub(crate) use describe::{PayloadKind, describe_payload};
pub(crate) use scan::{LineSource, Scanner, scan_until_recognized};
pub(crate) use strategy::{Detection, extract_employee_code, interpret};
