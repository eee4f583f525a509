pub mod api;
pub mod audio;
pub mod error;
pub mod http;
pub mod multipart;
pub mod progress;
pub mod publish;
pub mod state;
pub mod vault;

// Re-export main types for convenience
pub use api::ApiClient;
pub use audio::{AudioAsset, AudioReference, detect, strip_embeds};
pub use error::{
    AudioError, DispatchError, DocumentError, MetadataWriteError, PublishError, SettingsError,
    TranscriptionError,
};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use progress::{
    NoopReporter, PublishEvent, PublishReporter, PublishStage, SharedReporter,
};
pub use publish::{
    EditingStatus, OptionIntent, PublishOptions, PublishOutcome, PublishRequest, Publisher,
    slugify,
};
pub use state::{Destination, Settings, SettingsStore, read_metadata, rewrite_metadata};
pub use vault::{FsVault, Vault};
