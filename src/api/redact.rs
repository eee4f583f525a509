use serde_json::{Map, Value};

/// Replacement for credentials in the debug trace
pub const REDACTED: &str = "[REDACTED]";

/// Longest text value kept verbatim in the debug trace
pub const MAX_LOGGED_CHARS: usize = 500;

const SECRET_FIELDS: &[&str] = &["api_key"];
const LONG_TEXT_FIELDS: &[&str] = &["content", "markdown"];

/// Cut text to [`MAX_LOGGED_CHARS`] characters, noting the original length
pub fn truncate_for_log(text: &str) -> String {
    let total = text.chars().count();
    if total <= MAX_LOGGED_CHARS {
        return text.to_string();
    }

    let kept: String = text.chars().take(MAX_LOGGED_CHARS).collect();
    format!("{}... [truncated, total length: {}]", kept, total)
}

/// Request fields as a JSON object safe to persist
pub fn redact_fields<K: AsRef<str>, V: AsRef<str>>(fields: &[(K, V)]) -> Value {
    let mut object = Map::new();
    for (name, value) in fields {
        let name = name.as_ref();
        let value = value.as_ref();

        let logged = if SECRET_FIELDS.contains(&name) {
            REDACTED.to_string()
        } else if LONG_TEXT_FIELDS.contains(&name) {
            truncate_for_log(value)
        } else {
            value.to_string()
        };
        object.insert(name.to_string(), Value::String(logged));
    }
    Value::Object(object)
}
