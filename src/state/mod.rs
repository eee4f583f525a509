mod frontmatter;
mod logs;
mod mapping;
mod settings;

pub use frontmatter::{
    DESTINATION_KEY, EDITING_STATUS_KEY, Frontmatter, URL_KEY, read_metadata, rewrite_metadata,
};
pub use logs::{
    DEBUG_LOG_CAPACITY, DebugKind, DebugLogEntry, PUBLISH_LOG_CAPACITY, PublishLogEntry, RingLog,
};
pub use mapping::{PostMapping, upsert_mapping};
pub use settings::{
    DEFAULT_MAX_AUDIO_MB, Destination, MAX_DESTINATION_NAME_LEN, MAX_DESTINATIONS,
    PublishDefaults, Settings, SettingsStore, validate_destination_name,
};
