use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Capacity of the publish history
pub const PUBLISH_LOG_CAPACITY: usize = 100;

/// Capacity of the debug trace
pub const DEBUG_LOG_CAPACITY: usize = 50;

/// Fixed-capacity log with the newest entry first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RingLog<T> {
    entries: VecDeque<T>,
}

impl<T> Default for RingLog<T> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }
}

impl<T> RingLog<T> {
    /// Insert at the head, dropping the oldest entries beyond `capacity`
    pub fn push(&mut self, entry: T, capacity: usize) {
        self.entries.push_front(entry);
        self.entries.truncate(capacity);
    }

    pub fn truncate(&mut self, capacity: usize) {
        self.entries.truncate(capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    /// Entries from newest to oldest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

/// One publish attempt, successful or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishLogEntry {
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub slug: String,
    pub url: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PublishLogEntry {
    pub fn success(title: &str, slug: &str, url: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            title: title.to_string(),
            slug: slug.to_string(),
            url: url.to_string(),
            success: true,
            error_code: None,
            error_message: None,
        }
    }

    pub fn failure(title: &str, slug: &str, error_code: Option<u16>, message: String) -> Self {
        Self {
            timestamp: Utc::now(),
            title: title.to_string(),
            slug: slug.to_string(),
            url: String::new(),
            success: false,
            error_code,
            error_message: Some(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugKind {
    Request,
    Response,
    Error,
    Info,
}

/// One request, response or note in the debug trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugLogEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: DebugKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Request fields with secrets masked and long text truncated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DebugLogEntry {
    pub fn new(kind: DebugKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            endpoint: None,
            method: None,
            payload: None,
            status: None,
            body: None,
            message: None,
        }
    }

    pub fn endpoint(mut self, method: &str, endpoint: &str) -> Self {
        self.method = Some(method.to_string());
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
