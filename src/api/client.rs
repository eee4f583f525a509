// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde_json::Value;
use tracing::{debug, warn};

use crate::audio::AudioAsset;
use crate::error::{DispatchError, TranscriptionError};
use crate::http::{FORM_CONTENT_TYPE, HttpClient, encode_form, join_url};
use crate::multipart::{self, FilePart};
use crate::state::{DebugKind, DebugLogEntry, Destination, SettingsStore};

use super::classify::{classify_flag_response, classify_response, parse_body};
use super::redact::{redact_fields, truncate_for_log};

/// Endpoint that creates or updates a post
pub const PUBLISH_ENDPOINT: &str = "/api/publish";

/// Endpoint that receives the audio file of an episode
pub const UPLOAD_AUDIO_ENDPOINT: &str = "/api/upload-audio";

/// Endpoint that starts transcription of an uploaded audio file
pub const TRANSCRIBE_ENDPOINT: &str = "/api/transcribe";

/// Field name of the binary part in audio uploads
const AUDIO_FIELD: &str = "audio";

/// Ordered form fields of a request
pub type FormFields = Vec<(String, String)>;

/// Audio file ready to be sent
#[derive(Debug, Clone, Copy)]
pub struct AudioUpload<'a> {
    pub asset: &'a AudioAsset,
    pub bytes: &'a [u8],
    /// Remote name the service stores the audio under
    pub filename_base: &'a str,
    pub remove_silence: bool,
}

/// Parameters of a transcription request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionRequest {
    pub audio_filename: String,
    pub json_filename: String,
    pub ai_model: Option<String>,
    pub ai_provider: Option<String>,
}

/// Sends requests to a destination and records them in the debug trace
#[derive(Clone)]
pub struct ApiClient<C> {
    client: C,
    settings: SettingsStore,
}

impl<C: HttpClient> ApiClient<C> {
    pub fn new(client: C, settings: SettingsStore) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// POST a URL-encoded form and classify the `{"status": ...}` response
    ///
    /// Empty fields are dropped; the destination's API key is added.
    pub async fn send(
        &self,
        endpoint: &str,
        fields: &[(String, String)],
        destination: &Destination,
    ) -> Result<Value, DispatchError> {
        let (status, body) = self.post_form(endpoint, fields, destination).await?;
        let result = classify_response(status, body);
        self.record_outcome(endpoint, &result).await;
        result
    }

    /// Upload an audio file, returning the filename the service stored it as
    pub async fn upload_audio(
        &self,
        upload: AudioUpload<'_>,
        destination: &Destination,
    ) -> Result<String, DispatchError> {
        let remove_silence = if upload.remove_silence { "true" } else { "false" };
        let fields = [
            ("filename_base", upload.filename_base),
            ("api_key", destination.api_key.as_str()),
            ("remove_silence", remove_silence),
        ];
        let encoded = multipart::encode(
            &fields,
            &FilePart {
                field_name: AUDIO_FIELD,
                file_name: &upload.asset.file.name,
                mime_type: upload.asset.mime_type,
                bytes: upload.bytes,
            },
        );

        let mut payload = redact_fields(&fields);
        if let Value::Object(ref mut map) = payload {
            map.insert(
                AUDIO_FIELD.to_string(),
                Value::String(format!(
                    "{} ({} bytes, {})",
                    upload.asset.file.name,
                    upload.bytes.len(),
                    upload.asset.mime_type
                )),
            );
        }

        let (status, body) = self
            .post(
                UPLOAD_AUDIO_ENDPOINT,
                &encoded.content_type(),
                encoded.body,
                payload,
                destination,
            )
            .await?;

        let result = classify_flag_response(status, body).and_then(|body| {
            body.get("filename")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .ok_or_else(|| DispatchError::Api {
                    status,
                    message: "Upload response did not include a filename".to_string(),
                })
        });
        self.record_outcome(UPLOAD_AUDIO_ENDPOINT, &result).await;
        result
    }

    /// Ask the service to transcribe an uploaded audio file
    pub async fn trigger_transcription(
        &self,
        request: &TranscriptionRequest,
        destination: &Destination,
    ) -> Result<(), TranscriptionError> {
        let mut fields: FormFields = vec![
            ("audio_filename".to_string(), request.audio_filename.clone()),
            ("json_filename".to_string(), request.json_filename.clone()),
        ];
        if let Some(model) = &request.ai_model {
            fields.push(("ai_model".to_string(), model.clone()));
        }
        if let Some(provider) = &request.ai_provider {
            fields.push(("ai_provider".to_string(), provider.clone()));
        }

        let (status, body) = self
            .post_form(TRANSCRIBE_ENDPOINT, &fields, destination)
            .await?;
        let result = classify_flag_response(status, body).map(|_| ());
        self.record_outcome(TRANSCRIBE_ENDPOINT, &result).await;
        Ok(result?)
    }

    async fn post_form(
        &self,
        endpoint: &str,
        fields: &[(String, String)],
        destination: &Destination,
    ) -> Result<(u16, Value), DispatchError> {
        let mut fields = fields.to_vec();
        fields.push(("api_key".to_string(), destination.api_key.clone()));
        fields.retain(|(_, value)| !value.is_empty());

        let body = encode_form(&fields).into_bytes();
        self.post(
            endpoint,
            FORM_CONTENT_TYPE,
            body,
            redact_fields(&fields),
            destination,
        )
        .await
    }

    async fn post(
        &self,
        endpoint: &str,
        content_type: &str,
        body: Vec<u8>,
        payload: Value,
        destination: &Destination,
    ) -> Result<(u16, Value), DispatchError> {
        let url = join_url(&destination.base_url, endpoint);
        debug!(%url, bytes = body.len(), "Sending request");

        self.settings
            .record_debug(
                DebugLogEntry::new(DebugKind::Request)
                    .endpoint("POST", endpoint)
                    .payload(payload),
            )
            .await;

        let response = match self.client.post(&url, content_type, body).await {
            Ok(response) => response,
            Err(e) => {
                let message = e.to_string();
                warn!(%url, error = %message, "Request failed");
                self.settings
                    .record_debug(
                        DebugLogEntry::new(DebugKind::Error)
                            .endpoint("POST", endpoint)
                            .message(message.clone()),
                    )
                    .await;
                return Err(DispatchError::Network { message });
            }
        };

        debug!(%url, status = response.status, "Received response");
        self.settings
            .record_debug(
                DebugLogEntry::new(DebugKind::Response)
                    .endpoint("POST", endpoint)
                    .status(response.status)
                    .body(truncate_for_log(&String::from_utf8_lossy(&response.body))),
            )
            .await;

        Ok((response.status, parse_body(&response.body)))
    }

    async fn record_outcome<T>(&self, endpoint: &str, result: &Result<T, DispatchError>) {
        let entry = match result {
            Ok(_) => DebugLogEntry::new(DebugKind::Info)
                .endpoint("POST", endpoint)
                .message("success"),
            Err(e) => {
                let mut entry = DebugLogEntry::new(DebugKind::Error)
                    .endpoint("POST", endpoint)
                    .message(e.to_string());
                if let Some(status) = e.status() {
                    entry = entry.status(status);
                }
                entry
            }
        };
        self.settings.record_debug(entry).await;
    }
}
