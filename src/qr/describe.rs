use std::fmt;

const URL_PREVIEW: usize = 30;
const TEXT_PREVIEW: usize = 20;

/// What a rejected payload looked like, for the "unrecognized code" message
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PayloadKind {
    Empty,
    Url(String),
    Json,
    Text(String),
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadKind::Empty => f.write_str("empty code"),
            PayloadKind::Url(preview) => write!(f, "URL: {preview}"),
            PayloadKind::Json => f.write_str("JSON data"),
            PayloadKind::Text(preview) => write!(f, "text: {preview}"),
        }
    }
}

fn preview(raw: &str, limit: usize) -> String {
    if raw.chars().count() > limit {
        let head: String = raw.chars().take(limit).collect();
        format!("{head}...")
    } else {
        raw.to_string()
    }
}

fn is_cyrillic(c: char) -> bool {
    matches!(c, 'а'..='я' | 'А'..='Я')
}

pub(crate) fn describe_payload(raw: &str) -> PayloadKind {
    if raw.is_empty() {
        return PayloadKind::Empty;
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return PayloadKind::Url(preview(raw, URL_PREVIEW));
    }
    if raw.starts_with("{\"") && raw.ends_with('}') {
        return PayloadKind::Json;
    }
    if raw.chars().any(is_cyrillic) {
        return PayloadKind::Text(preview(raw, TEXT_PREVIEW));
    }
    PayloadKind::Text(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_payloads() {
        assert_eq!(describe_payload(""), PayloadKind::Empty);
        assert_eq!(describe_payload(r#"{"a":1}"#), PayloadKind::Json);
        assert_eq!(
            describe_payload("hello world"),
            PayloadKind::Text("hello world".into())
        );
    }

    #[test]
    fn long_urls_are_truncated() {
        let kind = describe_payload("https://example.com/a/very/long/path/to/something");
        assert_eq!(kind.to_string(), "URL: https://example.com/a/very/lon...");
        let kind = describe_payload("http://x.io");
        assert_eq!(kind.to_string(), "URL: http://x.io");
    }

    #[test]
    fn cyrillic_text_is_truncated_by_chars() {
        let kind = describe_payload("Пропуск сотрудника склада номер один");
        assert_eq!(kind.to_string(), "text: Пропуск сотрудника с...");
    }
}
