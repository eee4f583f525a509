mod classify;
mod client;
mod redact;

pub use classify::{classify_flag_response, classify_response, parse_body};
pub use client::{
    ApiClient, AudioUpload, FormFields, PUBLISH_ENDPOINT, TRANSCRIBE_ENDPOINT,
    TranscriptionRequest, UPLOAD_AUDIO_ENDPOINT,
};
pub use redact::{MAX_LOGGED_CHARS, REDACTED, redact_fields, truncate_for_log};
