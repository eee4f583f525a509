use serde_json::Value;

use crate::error::DispatchError;

const SUCCESS_STATUS: &str = "success";
const CODED_STATUS_PREFIX: &str = "ERROR_";

/// Parse a response body, treating anything that is not JSON as empty
pub fn parse_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

fn error_message(body: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .filter(|message| !message.is_empty())
        .map(String::from)
}

/// Status code carried in a body `status` of the form `ERROR_<digits>`
fn coded_status(body: &Value) -> Option<u16> {
    let digits = body
        .get("status")
        .and_then(Value::as_str)?
        .strip_prefix(CODED_STATUS_PREFIX)?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn failure(http_status: u16, body: &Value) -> DispatchError {
    if http_status == 200 {
        return DispatchError::Api {
            status: 200,
            message: error_message(body).unwrap_or_else(|| "Unknown error".to_string()),
        };
    }

    DispatchError::Api {
        status: coded_status(body).unwrap_or(http_status),
        message: error_message(body).unwrap_or_else(|| format!("HTTP {}", http_status)),
    }
}

/// Classify a publish-style response (`{"status": "success", ...}`)
pub fn classify_response(http_status: u16, body: Value) -> Result<Value, DispatchError> {
    let succeeded = http_status == 200
        && body.get("status").and_then(Value::as_str) == Some(SUCCESS_STATUS);

    if succeeded {
        Ok(body)
    } else {
        Err(failure(http_status, &body))
    }
}

/// Classify an upload or transcription response (`{"success": true, ...}`)
pub fn classify_flag_response(http_status: u16, body: Value) -> Result<Value, DispatchError> {
    let succeeded =
        http_status == 200 && body.get("success").and_then(Value::as_bool) == Some(true);

    if succeeded {
        Ok(body)
    } else {
        Err(failure(http_status, &body))
    }
}
