//! Employee code extraction from scanned payloads
//!
//! Badges in the wild carry the code bare, as a query parameter, as a URL
//! path segment, buried in free text, or inside a small JSON object. Each
//! shape is one strategy; they are tried in a fixed order.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::auth::EmployeeCode;

static WHOLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^EMP[0-9]{3}$").expect("valid whole-string regex"));
static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:CODE|ID|EMP|EMPLOYEE|USER)[=:]?\s*(EMP[0-9]{3})")
        .expect("valid keyword regex")
});
static PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/(EMP[0-9]{3})(?:/|$|\?|#)").expect("valid path regex")
});
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"EMP[0-9]{3}").expect("valid token regex"));

/// JSON fields that may carry the code, highest priority first
const JSON_FIELDS: &[&str] = &["employee_code", "code", "emp_code", "emp", "id", "user_code"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Strategy {
    WholeString,
    KeywordPrefixed,
    PathEmbedded,
    Anywhere,
    StructuredPayload,
}

impl Strategy {
    pub(crate) const ORDER: [Strategy; 5] = [
        Strategy::WholeString,
        Strategy::KeywordPrefixed,
        Strategy::PathEmbedded,
        Strategy::Anywhere,
        Strategy::StructuredPayload,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Strategy::WholeString => "whole-string",
            Strategy::KeywordPrefixed => "keyword",
            Strategy::PathEmbedded => "url-path",
            Strategy::Anywhere => "anywhere",
            Strategy::StructuredPayload => "json",
        }
    }

    /// `clean` is the trimmed, uppercased payload; `raw` is untouched
    fn apply(self, raw: &str, clean: &str) -> Option<EmployeeCode> {
        let token = match self {
            Strategy::WholeString => WHOLE_RE.find(clean).map(|m| m.as_str()),
            Strategy::KeywordPrefixed => capture(&KEYWORD_RE, clean),
            Strategy::PathEmbedded => capture(&PATH_RE, clean),
            Strategy::Anywhere => TOKEN_RE.find(clean).map(|m| m.as_str()),
            Strategy::StructuredPayload => return from_json(raw),
        };
        token.and_then(EmployeeCode::from_token)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)?.get(1).map(|m| m.as_str())
}

/// JavaScript-style truthiness, which decides which field is consulted
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn from_json(raw: &str) -> Option<EmployeeCode> {
    // Not JSON, or not an object: this strategy simply doesn't apply
    let Value::Object(map) = serde_json::from_str::<Value>(raw).ok()? else {
        return None;
    };
    let value = JSON_FIELDS
        .iter()
        .filter_map(|field| map.get(*field))
        .find(|v| is_truthy(v))?;
    let upper = value.as_str()?.to_uppercase();
    TOKEN_RE
        .find(&upper)
        .and_then(|m| EmployeeCode::from_token(m.as_str()))
}

/// Recognized code and the strategy that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Detection {
    pub(crate) code: EmployeeCode,
    pub(crate) strategy: Strategy,
}

pub(crate) fn interpret(raw: &str) -> Option<Detection> {
    if raw.is_empty() {
        return None;
    }
    let clean = raw.trim().to_uppercase();
    Strategy::ORDER.iter().find_map(|&strategy| {
        strategy
            .apply(raw, &clean)
            .map(|code| Detection { code, strategy })
    })
}

pub(crate) fn extract_employee_code(raw: &str) -> Option<EmployeeCode> {
    interpret(raw).map(|d| d.code)
}
