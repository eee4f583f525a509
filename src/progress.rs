use std::sync::Arc;

/// Stages a single publish moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    Idle,
    ResolvingAudio,
    UploadingAudio,
    Dispatching,
    Succeeded,
    Failed,
}

/// Events emitted while publishing, for a UI to render
#[derive(Debug, Clone, PartialEq)]
pub enum PublishEvent {
    /// The publish entered a new stage
    StageChanged { stage: PublishStage },

    /// An audio reference was found in the document
    AudioDetected { reference: String, byte_size: u64 },

    /// The audio file was accepted by the service
    AudioUploaded { remote_filename: String },

    /// The post was created or updated
    Published {
        title: String,
        url: String,
        /// Whether an existing post was updated
        updated: bool,
    },

    /// The publish was aborted
    Failed { error: String },

    /// The service accepted the transcription request
    TranscriptionStarted { audio_filename: String },

    /// Something went wrong that does not affect the publish result
    Notice { message: String },
}

/// Trait for reporting publish events.
///
/// Implementations can use this to show a spinner, log messages,
/// or collect events in tests.
pub trait PublishReporter: Send + Sync {
    /// Report a publish event
    fn report(&self, event: PublishEvent);
}

/// A shared reference to a publish reporter
pub type SharedReporter = Arc<dyn PublishReporter>;

/// A no-op reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl PublishReporter for NoopReporter {
    fn report(&self, _event: PublishEvent) {
        // Intentionally empty
    }
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedReporter {
        Arc::new(Self)
    }
}

/// Reporter that keeps every event, in order
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: std::sync::Mutex<Vec<PublishEvent>>,
}

impl CollectingReporter {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<PublishEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Stages reported so far
    pub fn stages(&self) -> Vec<PublishStage> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PublishEvent::StageChanged { stage } => Some(stage),
                _ => None,
            })
            .collect()
    }
}

impl PublishReporter for CollectingReporter {
    fn report(&self, event: PublishEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
