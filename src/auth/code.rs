use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::AuthError;

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^EMP[0-9]{3}$").expect("valid employee code regex"));

/// Longest value the manual entry mask lets through
const MASKED_LEN: usize = 6;

/// Canonical employee code: `EMP` followed by exactly three ASCII digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct EmployeeCode(String);

impl EmployeeCode {
    /// Trim, uppercase and validate
    pub(crate) fn parse(raw: &str) -> Result<Self, AuthError> {
        let clean = raw.trim().to_uppercase();
        if CODE_RE.is_match(&clean) {
            Ok(EmployeeCode(clean))
        } else {
            Err(AuthError::InvalidCodeFormat {
                input: raw.trim().to_string(),
            })
        }
    }

    /// Wrap a token already known to match the code pattern
    pub(crate) fn from_token(token: &str) -> Option<Self> {
        CODE_RE
            .is_match(token)
            .then(|| EmployeeCode(token.to_string()))
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for EmployeeCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EmployeeCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        EmployeeCode::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Keystroke mask for the manual code field.
///
/// Uppercases, drops anything outside `[A-Z0-9]`, prefixes a bare run of up
/// to three leading digits with `EMP`, and cuts the result at six chars.
/// Does not validate.
pub(crate) fn mask_manual_input(raw: &str) -> String {
    let mut value: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect();

    if value.starts_with(|c: char| c.is_ascii_digit()) && value.len() <= 3 {
        value.insert_str(0, "EMP");
    }

    value.truncate(MASKED_LEN);
    value
}
