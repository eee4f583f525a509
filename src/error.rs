use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating or checking an embedded audio file.
///
/// All of these are local: no network request is made once one occurs.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Video files are not supported (.{extension}). Please attach an audio file instead.")]
    VideoNotSupported { extension: String },

    #[error("Unsupported audio format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("Audio file is too large ({size_mb:.2} MB). Maximum size is {max_mb} MB.")]
    TooLarge { size_mb: f64, max_mb: u64 },

    #[error("Audio file not found: {reference}")]
    NotFound { reference: String },

    #[error("Failed to read audio file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of a request the remote service did not accept
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The service answered, but reported a failure
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never produced an HTTP response
    #[error("Network error: {message}")]
    Network { message: String },
}

impl DispatchError {
    /// Effective status code, if the service produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::Api { status, .. } => Some(*status),
            DispatchError::Network { .. } => None,
        }
    }

    /// Human readable message without the classification prefix
    pub fn message(&self) -> &str {
        match self {
            DispatchError::Api { message, .. } | DispatchError::Network { message } => message,
        }
    }
}

/// Errors that can occur while loading, saving or editing settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings JSON in {path}: {source}")]
    JsonParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    JsonSerializeFailed(#[from] serde_json::Error),

    #[error("Invalid destination name '{name}': {reason}")]
    InvalidDestinationName { name: String, reason: &'static str },

    #[error("A destination named '{0}' already exists")]
    DuplicateDestination(String),

    #[error("At most {0} destinations can be configured")]
    TooManyDestinations(usize),

    #[error("No destination named '{0}'")]
    UnknownDestination(String),
}

/// Errors reading or writing a document through the vault
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read document {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write document {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of the transcription trigger.
///
/// Never aborts a publish: it is logged and reported as a notice only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Transcription request failed: {0}")]
pub struct TranscriptionError(#[from] pub DispatchError);

/// Failure to record the publish result in the document's metadata block.
///
/// The remote post already exists at this point, so this is a warning only.
#[derive(Error, Debug)]
#[error("Published, but the metadata block could not be updated: {0}")]
pub struct MetadataWriteError(#[from] pub DocumentError);

/// Errors that abort a single publish attempt
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("No destination is configured")]
    NoDestination,

    #[error("Title '{title}' has no letters or digits to build a slug from")]
    EmptySlug { title: String },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("Audio upload failed: {0}")]
    Upload(DispatchError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl PublishError {
    /// Status code recorded in the publish log, when one exists
    pub fn error_code(&self) -> Option<u16> {
        match self {
            PublishError::Upload(e) | PublishError::Dispatch(e) => e.status(),
            _ => None,
        }
    }
}
