// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, AudioUpload, PUBLISH_ENDPOINT, TranscriptionRequest};
use crate::audio::{AudioAsset, detect, resolve, strip_embeds, validate};
use crate::error::{
    AudioError, DocumentError, MetadataWriteError, PublishError, TranscriptionError,
};
use crate::http::{HttpClient, join_url};
use crate::progress::{PublishEvent, PublishStage, SharedReporter};
use crate::state::{
    Destination, PublishLogEntry, SettingsStore, rewrite_metadata, upsert_mapping,
};
use crate::vault::{Vault, file_stem};

use super::form::{EditingStatus, PublishDraft, PublishOptions, build_publish_fields, slugify};

/// What to publish and where
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Vault path of the document
    pub source_path: String,
    /// Defaults to the document's file stem
    pub title: Option<String>,
    /// Index into the configured destinations; the selected one when `None`
    pub destination: Option<usize>,
    pub options: PublishOptions,
}

/// Result of a successful publish
#[derive(Debug)]
pub struct PublishOutcome {
    pub title: String,
    pub slug: String,
    pub url: String,
    pub destination: String,
    pub editing_status: EditingStatus,
    /// Identifier returned by the service, if any
    pub remote_identifier: Option<String>,
    /// Whether an existing post was updated rather than created
    pub updated: bool,
    /// Remote name of the uploaded audio file
    pub audio_filename: Option<String>,
    /// Soft failures that did not affect the result
    pub warnings: Vec<String>,
    /// Detached transcription task, for callers that must outlive it
    pub transcription: Option<JoinHandle<Result<(), TranscriptionError>>>,
}

/// Audio that passed validation, with its contents loaded
struct PreparedAudio {
    asset: AudioAsset,
    bytes: Vec<u8>,
}

/// Runs publishes: audio upload, the publish request and local bookkeeping
///
/// Each stage is awaited before the next one starts. Separate calls are not
/// coordinated with each other; publishing the same document twice at once
/// can create two remote posts.
pub struct Publisher<C, V: ?Sized> {
    api: ApiClient<C>,
    vault: Arc<V>,
    settings: SettingsStore,
    reporter: SharedReporter,
}

impl<C, V> Publisher<C, V>
where
    C: HttpClient + Clone + 'static,
    V: Vault + ?Sized,
{
    pub fn new(
        client: C,
        vault: Arc<V>,
        settings: SettingsStore,
        reporter: SharedReporter,
    ) -> Self {
        Self {
            api: ApiClient::new(client, settings.clone()),
            vault,
            settings,
            reporter,
        }
    }

    fn stage(&self, stage: PublishStage) {
        self.reporter.report(PublishEvent::StageChanged { stage });
    }

    /// Publish a document, creating the post or updating the one it maps to
    #[instrument(skip(self, request), fields(source = %request.source_path))]
    pub async fn publish(&self, request: PublishRequest) -> Result<PublishOutcome, PublishError> {
        self.stage(PublishStage::Idle);

        let title = request
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| file_stem(&request.source_path).to_string());
        let slug = slugify(&title);

        match self.run(&request, &title, &slug).await {
            Ok(outcome) => {
                self.stage(PublishStage::Succeeded);
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, "Publish failed");
                self.settings
                    .update_best_effort(|s| {
                        s.record_publish(PublishLogEntry::failure(
                            &title,
                            &slug,
                            e.error_code(),
                            e.to_string(),
                        ))
                    })
                    .await;
                self.reporter.report(PublishEvent::Failed {
                    error: e.to_string(),
                });
                self.stage(PublishStage::Failed);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &PublishRequest,
        title: &str,
        slug: &str,
    ) -> Result<PublishOutcome, PublishError> {
        let settings = self.settings.snapshot().await;
        let destination = request
            .destination
            .map_or_else(|| settings.selected(), |index| settings.destination(index))
            .cloned()
            .ok_or(PublishError::NoDestination)?;

        let document = self
            .vault
            .read_text(&request.source_path)
            .await
            .map_err(|e| DocumentError::ReadFailed {
                path: request.source_path.clone(),
                source: e,
            })?;

        self.stage(PublishStage::ResolvingAudio);
        // The slug names the remote post, its audio and its transcript
        if slug.is_empty() {
            return Err(PublishError::EmptySlug {
                title: title.to_string(),
            });
        }
        let audio = self
            .prepare_audio(&document, &request.source_path, settings.max_audio_size_mb)
            .await?;

        let audio_filename = match &audio {
            Some(prepared) => {
                self.stage(PublishStage::UploadingAudio);
                let remote_filename = self
                    .api
                    .upload_audio(
                        AudioUpload {
                            asset: &prepared.asset,
                            bytes: &prepared.bytes,
                            filename_base: slug,
                            remove_silence: request.options.remove_silence(),
                        },
                        &destination,
                    )
                    .await
                    .map_err(PublishError::Upload)?;
                info!(%remote_filename, "Audio uploaded");
                self.reporter.report(PublishEvent::AudioUploaded {
                    remote_filename: remote_filename.clone(),
                });
                Some(remote_filename)
            }
            None => None,
        };

        self.stage(PublishStage::Dispatching);
        let markdown = strip_embeds(&document);
        let editing_status = request.options.editing_status_for(&destination);
        let mapping = settings.post_mappings.get(&request.source_path);
        let fields = build_publish_fields(
            &PublishDraft {
                title,
                slug,
                markdown: &markdown,
                options: &request.options,
                editing_status,
                destination_name: &destination.name,
            },
            mapping,
            audio_filename.as_deref(),
        );

        let body = self
            .api
            .send(PUBLISH_ENDPOINT, &fields, &destination)
            .await?;

        // The post exists remotely from here on; local failures are warnings.
        let updated = mapping.is_some();
        let remote_identifier = body
            .get("filename_base")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(String::from);
        let url = canonical_url(&destination, &body, request.options.publish_public());
        let mut warnings = Vec::new();

        let source_path = request.source_path.clone();
        let log_entry = PublishLogEntry::success(title, slug, &url);
        let identifier = remote_identifier.clone();
        let saved = self
            .settings
            .update(move |s| {
                if let Some(identifier) = identifier {
                    upsert_mapping(&mut s.post_mappings, &source_path, &identifier);
                }
                s.record_publish(log_entry);
            })
            .await;
        if let Err(e) = saved {
            warn!(error = %e, "Failed to save publish state");
            warnings.push(format!("Published, but local state could not be saved: {}", e));
        }

        let status_for_metadata = destination.magazine_mode.then_some(editing_status);
        if let Err(e) = self
            .sync_metadata(&request.source_path, &destination, &url, status_for_metadata)
            .await
        {
            warn!(error = %e, "Failed to update document metadata");
            warnings.push(e.to_string());
        }

        for warning in &warnings {
            self.reporter.report(PublishEvent::Notice {
                message: warning.clone(),
            });
        }

        info!(%url, updated, "Published");
        self.reporter.report(PublishEvent::Published {
            title: title.to_string(),
            url: url.clone(),
            updated,
        });

        let transcription = match (&audio_filename, request.options.transcribe()) {
            (Some(audio_filename), true) => Some(self.spawn_transcription(
                TranscriptionRequest {
                    audio_filename: audio_filename.clone(),
                    json_filename: format!("{}.json", slug),
                    ai_model: request.options.ai_model.clone(),
                    ai_provider: request.options.ai_provider.clone(),
                },
                destination.clone(),
            )),
            _ => None,
        };

        Ok(PublishOutcome {
            title: title.to_string(),
            slug: slug.to_string(),
            url,
            destination: destination.name,
            editing_status,
            remote_identifier,
            updated,
            audio_filename,
            warnings,
            transcription,
        })
    }

    /// Find, check and load the document's audio file, if it references one
    async fn prepare_audio(
        &self,
        document: &str,
        source_path: &str,
        max_size_mb: u64,
    ) -> Result<Option<PreparedAudio>, PublishError> {
        let Some(reference) = detect(document) else {
            return Ok(None);
        };

        let file = resolve(self.vault.as_ref(), &reference, source_path).ok_or_else(|| {
            AudioError::NotFound {
                reference: reference.path.clone(),
            }
        })?;
        validate(&file, max_size_mb)?;

        self.reporter.report(PublishEvent::AudioDetected {
            reference: reference.path.clone(),
            byte_size: file.size,
        });

        let bytes = self
            .vault
            .read_bytes(&file.path)
            .await
            .map_err(|e| AudioError::ReadFailed {
                path: file.path.clone(),
                source: e,
            })?;

        Ok(Some(PreparedAudio {
            asset: AudioAsset::new(&reference, file),
            bytes,
        }))
    }

    /// Write destination, URL and status into the document's metadata block
    async fn sync_metadata(
        &self,
        source_path: &str,
        destination: &Destination,
        url: &str,
        editing_status: Option<EditingStatus>,
    ) -> Result<(), MetadataWriteError> {
        let current = self
            .vault
            .read_text(source_path)
            .await
            .map_err(|e| DocumentError::ReadFailed {
                path: source_path.to_string(),
                source: e,
            })?;

        let rewritten = rewrite_metadata(
            &current,
            &destination.name,
            url,
            editing_status.map(EditingStatus::as_str),
        );

        self.vault
            .write_text(source_path, &rewritten)
            .await
            .map_err(|e| DocumentError::WriteFailed {
                path: source_path.to_string(),
                source: e,
            })?;
        Ok(())
    }

    /// Start transcription without waiting for it
    ///
    /// The task only logs and reports its result.
    fn spawn_transcription(
        &self,
        request: TranscriptionRequest,
        destination: Destination,
    ) -> JoinHandle<Result<(), TranscriptionError>> {
        let api = self.api.clone();
        let reporter = self.reporter.clone();

        tokio::spawn(async move {
            let result = api.trigger_transcription(&request, &destination).await;
            match &result {
                Ok(()) => {
                    info!(audio = %request.audio_filename, "Transcription started");
                    reporter.report(PublishEvent::TranscriptionStarted {
                        audio_filename: request.audio_filename.clone(),
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Transcription request failed");
                    reporter.report(PublishEvent::Notice {
                        message: e.to_string(),
                    });
                }
            }
            result
        })
    }
}

/// URL of the published post on its destination
///
/// The public path is used when the post was made public and the service
/// returned one; otherwise the internal path.
pub fn canonical_url(destination: &Destination, body: &Value, publish_public: bool) -> String {
    let path_of = |key: &str| {
        body.get(key)
            .and_then(Value::as_str)
            .filter(|path| !path.is_empty())
    };

    let path = if publish_public {
        path_of("public_url").or_else(|| path_of("internal_url"))
    } else {
        path_of("internal_url")
    };

    match path {
        Some(path) => join_url(&destination.base_url, path),
        None => destination.base_url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockHttpClient;
    use crate::api::{TRANSCRIBE_ENDPOINT, UPLOAD_AUDIO_ENDPOINT};
    use crate::progress::{CollectingReporter, NoopReporter};
    use crate::publish::form::OptionIntent;
    use crate::state::{Settings, read_metadata};
    use crate::vault::FsVault;
    use serde_json::json;
    use tempfile::{TempDir, tempdir};

    const SUCCESS: &str = concat!(
        r#"{"status":"success","filename_base":"hello-world","#,
        r#""internal_url":"/p/hello-world","public_url":"/public/hello-world"}"#
    );

    fn destination(magazine_mode: bool) -> Destination {
        Destination {
            name: "blog".to_string(),
            base_url: "https://blog.example.com".to_string(),
            api_key: "secret".to_string(),
            magazine_mode,
        }
    }

    fn setup(document: &str, magazine_mode: bool) -> (TempDir, Arc<FsVault>, SettingsStore) {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("posts")).unwrap();
        std::fs::write(dir.path().join("posts/Hello World.md"), document).unwrap();
        let vault = Arc::new(FsVault::new(dir.path()));
        let settings = SettingsStore::in_memory(Settings {
            destinations: vec![destination(magazine_mode)],
            ..Default::default()
        });
        (dir, vault, settings)
    }

    fn request(options: PublishOptions) -> PublishRequest {
        PublishRequest {
            source_path: "posts/Hello World.md".to_string(),
            title: None,
            destination: None,
            options,
        }
    }

    #[tokio::test]
    async fn first_publish_creates_and_records_mapping() {
        let (dir, vault, settings) = setup("Some text\n", false);
        let mock = MockHttpClient::new().reply(PUBLISH_ENDPOINT, 200, SUCCESS);
        let reporter = CollectingReporter::shared();
        let publisher = Publisher::new(mock.clone(), vault, settings.clone(), reporter.clone());

        let outcome = publisher.publish(request(PublishOptions::default())).await.unwrap();

        assert_eq!(outcome.slug, "hello-world");
        assert_eq!(outcome.url, "https://blog.example.com/p/hello-world");
        assert!(!outcome.updated);
        assert!(outcome.transcription.is_none());

        let sent = &mock.requests_to(PUBLISH_ENDPOINT)[0];
        assert_eq!(sent.field("title").as_deref(), Some("Hello World"));
        assert_eq!(sent.field("editing_status").as_deref(), Some("feedback"));
        assert_eq!(sent.field("filename_base"), None);

        let snapshot = settings.snapshot().await;
        let mapping = &snapshot.post_mappings["posts/Hello World.md"];
        assert_eq!(mapping.remote_identifier, "hello-world");
        assert!(snapshot.publish_log.get(0).unwrap().success);

        let document = std::fs::read_to_string(dir.path().join("posts/Hello World.md")).unwrap();
        let metadata = read_metadata(&document);
        assert_eq!(metadata.get("destination-name"), Some("blog"));
        assert_eq!(
            metadata.get("canonical-url"),
            Some("https://blog.example.com/p/hello-world")
        );
        assert_eq!(metadata.get("editing-status"), None);
        assert_eq!(metadata.body, "Some text\n");

        assert_eq!(
            reporter.stages(),
            vec![
                PublishStage::Idle,
                PublishStage::ResolvingAudio,
                PublishStage::Dispatching,
                PublishStage::Succeeded
            ]
        );
    }

    #[tokio::test]
    async fn second_publish_sends_identifier() {
        let (_dir, vault, settings) = setup("Text\n", false);
        let mock = MockHttpClient::new()
            .reply(PUBLISH_ENDPOINT, 200, SUCCESS)
            .reply(PUBLISH_ENDPOINT, 200, SUCCESS);
        let publisher = Publisher::new(mock.clone(), vault, settings, NoopReporter::shared());

        publisher.publish(request(PublishOptions::default())).await.unwrap();
        let outcome = publisher.publish(request(PublishOptions::default())).await.unwrap();

        assert!(outcome.updated);
        let sent = mock.requests_to(PUBLISH_ENDPOINT);
        assert_eq!(sent[0].field("filename_base"), None);
        assert_eq!(sent[1].field("filename_base").as_deref(), Some("hello-world"));
    }

    #[tokio::test]
    async fn public_post_uses_public_url() {
        let (_dir, vault, settings) = setup("Text\n", false);
        let mock = MockHttpClient::new().reply(PUBLISH_ENDPOINT, 200, SUCCESS);
        let publisher = Publisher::new(mock, vault, settings, NoopReporter::shared());

        let options = PublishOptions::default().apply(OptionIntent::SetPublic(true));
        let outcome = publisher.publish(request(options)).await.unwrap();
        assert_eq!(outcome.url, "https://blog.example.com/public/hello-world");
        assert_eq!(outcome.editing_status, EditingStatus::Submission);
    }

    #[tokio::test]
    async fn magazine_status_is_written_to_metadata() {
        let (dir, vault, settings) = setup("Text\n", true);
        let mock = MockHttpClient::new().reply(PUBLISH_ENDPOINT, 200, SUCCESS);
        let publisher = Publisher::new(mock.clone(), vault, settings, NoopReporter::shared());

        let options = PublishOptions::default()
            .apply(OptionIntent::ChooseEditingStatus(EditingStatus::Submission));
        publisher.publish(request(options)).await.unwrap();

        let sent = &mock.requests_to(PUBLISH_ENDPOINT)[0];
        assert_eq!(sent.field("editing_status").as_deref(), Some("submission"));

        let document = std::fs::read_to_string(dir.path().join("posts/Hello World.md")).unwrap();
        assert_eq!(read_metadata(&document).get("editing-status"), Some("submission"));
    }

    #[tokio::test]
    async fn api_failure_is_logged_without_state_changes() {
        let document = "Body\n";
        let (dir, vault, settings) = setup(document, false);
        let mock = MockHttpClient::new().reply(
            PUBLISH_ENDPOINT,
            400,
            r#"{"status":"ERROR_422","error":"Bad slug"}"#,
        );
        let reporter = CollectingReporter::shared();
        let publisher = Publisher::new(mock, vault, settings.clone(), reporter.clone());

        let err = publisher.publish(request(PublishOptions::default())).await.unwrap_err();
        assert_eq!(err.error_code(), Some(422));

        let snapshot = settings.snapshot().await;
        assert!(snapshot.post_mappings.is_empty());
        let entry = snapshot.publish_log.get(0).unwrap();
        assert!(!entry.success);
        assert_eq!(entry.error_code, Some(422));
        assert_eq!(entry.error_message.as_deref(), Some("API error 422: Bad slug"));

        let unchanged = std::fs::read_to_string(dir.path().join("posts/Hello World.md")).unwrap();
        assert_eq!(unchanged, document);
        assert_eq!(reporter.stages().last(), Some(&PublishStage::Failed));
    }

    #[tokio::test]
    async fn missing_audio_fails_before_any_request() {
        let (_dir, vault, settings) = setup("![[missing.mp3]]\n", false);
        let mock = MockHttpClient::new();
        let publisher =
            Publisher::new(mock.clone(), vault, settings.clone(), NoopReporter::shared());

        let err = publisher.publish(request(PublishOptions::default())).await.unwrap_err();
        assert!(matches!(err, PublishError::Audio(AudioError::NotFound { .. })));
        assert!(mock.requests().is_empty());
        assert_eq!(settings.snapshot().await.publish_log.len(), 1);
    }

    #[tokio::test]
    async fn oversized_audio_is_rejected_locally() {
        let (dir, vault, settings) = setup("![[big.mp3]]\n", false);
        std::fs::write(dir.path().join("posts/big.mp3"), vec![0u8; 2 * 1024 * 1024]).unwrap();
        settings.update(|s| s.max_audio_size_mb = 1).await.unwrap();
        let mock = MockHttpClient::new();
        let publisher = Publisher::new(mock.clone(), vault, settings, NoopReporter::shared());

        let err = publisher.publish(request(PublishOptions::default())).await.unwrap_err();
        assert!(matches!(err, PublishError::Audio(AudioError::TooLarge { .. })));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn audio_is_uploaded_then_referenced() {
        let (dir, vault, settings) = setup("Intro\n![[ep.mp3]]\nOutro\n", false);
        std::fs::write(dir.path().join("posts/ep.mp3"), b"ID3data").unwrap();
        let mock = MockHttpClient::new()
            .reply(
                UPLOAD_AUDIO_ENDPOINT,
                200,
                r#"{"success":true,"filename":"hello-world.mp3"}"#,
            )
            .reply(PUBLISH_ENDPOINT, 200, SUCCESS);
        let reporter = CollectingReporter::shared();
        let publisher = Publisher::new(mock.clone(), vault, settings, reporter.clone());

        let outcome = publisher.publish(request(PublishOptions::default())).await.unwrap();
        assert_eq!(outcome.audio_filename.as_deref(), Some("hello-world.mp3"));

        let requests = mock.requests();
        assert!(requests[0].url.ends_with(UPLOAD_AUDIO_ENDPOINT));
        assert!(requests[1].url.ends_with(PUBLISH_ENDPOINT));

        let sent = &requests[1];
        assert_eq!(sent.field("markdown").as_deref(), Some("Intro\n\nOutro\n"));
        assert_eq!(sent.field("audio_file").as_deref(), Some("hello-world.mp3"));
        assert_eq!(sent.field("include_in_podcast").as_deref(), Some("true"));
        assert_eq!(sent.field("publish_immediately").as_deref(), Some("true"));

        assert!(reporter.stages().contains(&PublishStage::UploadingAudio));
    }

    #[tokio::test]
    async fn upload_failure_aborts_publish() {
        let (dir, vault, settings) = setup("![[ep.mp3]]\n", false);
        std::fs::write(dir.path().join("posts/ep.mp3"), b"ID3").unwrap();
        let mock = MockHttpClient::new().fail(UPLOAD_AUDIO_ENDPOINT, "connection reset");
        let publisher =
            Publisher::new(mock.clone(), vault, settings.clone(), NoopReporter::shared());

        let err = publisher.publish(request(PublishOptions::default())).await.unwrap_err();
        assert!(matches!(err, PublishError::Upload(_)));
        assert!(mock.requests_to(PUBLISH_ENDPOINT).is_empty());
        assert!(settings.snapshot().await.post_mappings.is_empty());
    }

    #[tokio::test]
    async fn transcription_failure_does_not_fail_publish() {
        let (dir, vault, settings) = setup("![[ep.mp3]]\n", false);
        std::fs::write(dir.path().join("posts/ep.mp3"), b"ID3").unwrap();
        let mock = MockHttpClient::new()
            .reply(
                UPLOAD_AUDIO_ENDPOINT,
                200,
                r#"{"success":true,"filename":"hello-world.mp3"}"#,
            )
            .reply(PUBLISH_ENDPOINT, 200, SUCCESS)
            .reply(TRANSCRIBE_ENDPOINT, 503, r#"{"error":"queue full"}"#);
        let reporter = CollectingReporter::shared();
        let publisher = Publisher::new(mock.clone(), vault, settings.clone(), reporter.clone());

        let options = PublishOptions::default().apply(OptionIntent::SetTranscribe(true));
        let outcome = publisher.publish(request(options)).await.unwrap();

        let transcription = outcome.transcription.unwrap().await.unwrap();
        assert!(transcription.is_err());

        let sent = &mock.requests_to(TRANSCRIBE_ENDPOINT)[0];
        assert_eq!(sent.field("audio_filename").as_deref(), Some("hello-world.mp3"));
        assert_eq!(sent.field("json_filename").as_deref(), Some("hello-world.json"));

        assert!(settings.snapshot().await.publish_log.get(0).unwrap().success);
        assert!(reporter.events().iter().any(|e| matches!(
            e,
            PublishEvent::Notice { message } if message.contains("queue full")
        )));
    }

    #[tokio::test]
    async fn no_destination_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "x").unwrap();
        let publisher = Publisher::new(
            MockHttpClient::new(),
            Arc::new(FsVault::new(dir.path())),
            SettingsStore::in_memory(Settings::default()),
            NoopReporter::shared(),
        );

        let err = publisher
            .publish(PublishRequest {
                source_path: "a.md".to_string(),
                title: Some("A".to_string()),
                destination: None,
                options: PublishOptions::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::NoDestination));
    }

    #[tokio::test]
    async fn title_without_slug_fails_before_any_request() {
        let (dir, vault, settings) = setup("![[ep.mp3]]\n", false);
        std::fs::write(dir.path().join("posts/ep.mp3"), b"ID3").unwrap();
        let mock = MockHttpClient::new();
        let publisher =
            Publisher::new(mock.clone(), vault, settings.clone(), NoopReporter::shared());

        let err = publisher
            .publish(PublishRequest {
                title: Some("!!!".to_string()),
                ..request(PublishOptions::default())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::EmptySlug { .. }));
        assert!(mock.requests().is_empty());

        let entry = settings.snapshot().await.publish_log.get(0).cloned().unwrap();
        assert!(!entry.success);
        assert_eq!(entry.title, "!!!");
    }

    /// Vault whose documents can be read but not written
    struct ReadOnlyVault(FsVault);

    #[async_trait::async_trait]
    impl Vault for ReadOnlyVault {
        fn entry(&self, path: &str) -> Option<crate::vault::VaultEntry> {
            self.0.entry(path)
        }

        async fn read_bytes(&self, path: &str) -> std::io::Result<Vec<u8>> {
            self.0.read_bytes(path).await
        }

        async fn read_text(&self, path: &str) -> std::io::Result<String> {
            self.0.read_text(path).await
        }

        async fn write_text(&self, _path: &str, _contents: &str) -> std::io::Result<()> {
            Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only vault",
            ))
        }
    }

    #[tokio::test]
    async fn metadata_write_failure_is_only_a_warning() {
        let (dir, _, settings) = setup("Text\n", false);
        let vault = Arc::new(ReadOnlyVault(FsVault::new(dir.path())));
        let mock = MockHttpClient::new().reply(PUBLISH_ENDPOINT, 200, SUCCESS);
        let reporter = CollectingReporter::shared();
        let publisher = Publisher::new(mock, vault, settings.clone(), reporter.clone());

        let outcome = publisher.publish(request(PublishOptions::default())).await.unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("read-only vault"));
        assert!(reporter.events().iter().any(|e| matches!(
            e,
            PublishEvent::Notice { message } if message.contains("metadata block")
        )));
        assert_eq!(reporter.stages().last(), Some(&PublishStage::Succeeded));

        let snapshot = settings.snapshot().await;
        assert!(snapshot.publish_log.get(0).unwrap().success);
        assert!(snapshot.post_mappings.contains_key("posts/Hello World.md"));
    }

    #[tokio::test]
    async fn settings_save_failure_is_only_a_warning() {
        let (dir, vault, _) = setup("Text\n", false);
        // A file where the settings folder should be makes every save fail
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let settings = SettingsStore::load(&blocker.join("settings.json")).unwrap();
        let added = settings
            .update(|s| s.add_destination(destination(false)))
            .await;
        assert!(added.is_err());

        let mock = MockHttpClient::new().reply(PUBLISH_ENDPOINT, 200, SUCCESS);
        let reporter = CollectingReporter::shared();
        let publisher = Publisher::new(mock, vault, settings.clone(), reporter.clone());

        let outcome = publisher.publish(request(PublishOptions::default())).await.unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("local state could not be saved"));
        assert!(
            reporter
                .events()
                .iter()
                .any(|e| matches!(e, PublishEvent::Notice { .. }))
        );
        assert_eq!(reporter.stages().last(), Some(&PublishStage::Succeeded));
        assert!(settings.snapshot().await.publish_log.get(0).unwrap().success);

        let document = std::fs::read_to_string(dir.path().join("posts/Hello World.md")).unwrap();
        assert_eq!(read_metadata(&document).get("destination-name"), Some("blog"));
    }

    #[test]
    fn canonical_url_prefers_public_path_only_when_public() {
        let dest = destination(false);
        let body = json!({"internal_url": "/i/x", "public_url": "/pub/x"});
        assert_eq!(canonical_url(&dest, &body, true), "https://blog.example.com/pub/x");
        assert_eq!(canonical_url(&dest, &body, false), "https://blog.example.com/i/x");

        let body = json!({"internal_url": "/i/x"});
        assert_eq!(canonical_url(&dest, &body, true), "https://blog.example.com/i/x");

        let body = json!({"public_url": ""});
        assert_eq!(canonical_url(&dest, &body, true), "https://blog.example.com");
    }
}
