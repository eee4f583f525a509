use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::SettingsError;

use super::logs::{
    DEBUG_LOG_CAPACITY, DebugLogEntry, PUBLISH_LOG_CAPACITY, PublishLogEntry, RingLog,
};
use super::mapping::PostMapping;

/// Maximum number of configured destinations
pub const MAX_DESTINATIONS: usize = 5;

/// Maximum length of a destination name
pub const MAX_DESTINATION_NAME_LEN: usize = 7;

/// Default upper bound for uploaded audio, in megabytes
pub const DEFAULT_MAX_AUDIO_MB: u64 = 25;

/// One remote service instance posts can be published to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    #[serde(default)]
    pub magazine_mode: bool,
}

/// Initial values of the publish options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishDefaults {
    pub publish_internal: bool,
    pub publish_public: bool,
    pub excerpt: bool,
    pub hidden: bool,
    pub tags: String,
    pub template: String,
    pub remove_silence: bool,
    pub include_in_podcast: bool,
    pub publish_immediately: bool,
    pub transcribe: bool,
    pub ai_model: Option<String>,
    pub ai_provider: Option<String>,
}

impl Default for PublishDefaults {
    fn default() -> Self {
        Self {
            publish_internal: true,
            publish_public: false,
            excerpt: false,
            hidden: false,
            tags: String::new(),
            template: String::new(),
            remove_silence: false,
            include_in_podcast: true,
            publish_immediately: true,
            transcribe: false,
            ai_model: None,
            ai_provider: None,
        }
    }
}

/// Everything the publisher persists between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub destinations: Vec<Destination>,
    pub selected_destination: usize,
    /// Keyed by vault path of the source document
    pub post_mappings: BTreeMap<String, PostMapping>,
    pub publish_log: RingLog<PublishLogEntry>,
    pub debug_log: RingLog<DebugLogEntry>,
    pub debug_mode: bool,
    pub defaults: PublishDefaults,
    pub max_audio_size_mb: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            destinations: Vec::new(),
            selected_destination: 0,
            post_mappings: BTreeMap::new(),
            publish_log: RingLog::default(),
            debug_log: RingLog::default(),
            debug_mode: false,
            defaults: PublishDefaults::default(),
            max_audio_size_mb: DEFAULT_MAX_AUDIO_MB,
        }
    }
}

impl Settings {
    /// Re-establish invariants after loading or editing
    pub fn normalize(&mut self) {
        self.destinations.truncate(MAX_DESTINATIONS);
        self.selected_destination = self.clamp_index(self.selected_destination);
        self.publish_log.truncate(PUBLISH_LOG_CAPACITY);
        self.debug_log.truncate(DEBUG_LOG_CAPACITY);
    }

    /// Clamp a destination index into range
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.destinations.len().saturating_sub(1))
    }

    pub fn destination(&self, index: usize) -> Option<&Destination> {
        self.destinations.get(self.clamp_index(index))
    }

    pub fn selected(&self) -> Option<&Destination> {
        self.destination(self.selected_destination)
    }

    pub fn destination_index(&self, name: &str) -> Option<usize> {
        self.destinations.iter().position(|d| d.name == name)
    }

    pub fn add_destination(&mut self, destination: Destination) -> Result<(), SettingsError> {
        validate_destination_name(&destination.name)?;

        if self.destination_index(&destination.name).is_some() {
            return Err(SettingsError::DuplicateDestination(destination.name));
        }
        if self.destinations.len() >= MAX_DESTINATIONS {
            return Err(SettingsError::TooManyDestinations(MAX_DESTINATIONS));
        }

        self.destinations.push(destination);
        Ok(())
    }

    pub fn remove_destination(&mut self, name: &str) -> Result<Destination, SettingsError> {
        let index = self
            .destination_index(name)
            .ok_or_else(|| SettingsError::UnknownDestination(name.to_string()))?;

        let removed = self.destinations.remove(index);
        if self.selected_destination > index {
            self.selected_destination -= 1;
        }
        self.selected_destination = self.clamp_index(self.selected_destination);
        Ok(removed)
    }

    pub fn select_destination(&mut self, name: &str) -> Result<(), SettingsError> {
        self.selected_destination = self
            .destination_index(name)
            .ok_or_else(|| SettingsError::UnknownDestination(name.to_string()))?;
        Ok(())
    }

    pub fn record_publish(&mut self, entry: PublishLogEntry) {
        self.publish_log.push(entry, PUBLISH_LOG_CAPACITY);
    }

    /// Append to the debug trace; ignored unless debug mode is on
    pub fn record_debug(&mut self, entry: DebugLogEntry) {
        if self.debug_mode {
            self.debug_log.push(entry, DEBUG_LOG_CAPACITY);
        }
    }
}

/// Check the naming rules for destinations
pub fn validate_destination_name(name: &str) -> Result<(), SettingsError> {
    let invalid = |reason| SettingsError::InvalidDestinationName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name.chars().count() > MAX_DESTINATION_NAME_LEN {
        return Err(invalid("name must be at most 7 characters"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid("name must not contain whitespace"));
    }
    Ok(())
}

/// Shared handle to the persisted settings
///
/// Loaded once, then saved after every mutation made through [`update`].
///
/// [`update`]: SettingsStore::update
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: Option<Arc<PathBuf>>,
    inner: Arc<Mutex<Settings>>,
}

impl SettingsStore {
    /// Load settings from `path`, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let mut settings = if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| SettingsError::ReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            serde_json::from_str::<Settings>(&content).map_err(|e| {
                SettingsError::JsonParseFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?
        } else {
            debug!(path = %path.display(), "No settings file, using defaults");
            Settings::default()
        };
        settings.normalize();

        Ok(Self {
            path: Some(Arc::new(path.to_path_buf())),
            inner: Arc::new(Mutex::new(settings)),
        })
    }

    /// Settings that are never written to disk
    pub fn in_memory(mut settings: Settings) -> Self {
        settings.normalize();
        Self {
            path: None,
            inner: Arc::new(Mutex::new(settings)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref().map(PathBuf::as_path)
    }

    /// Copy of the current settings
    pub async fn snapshot(&self) -> Settings {
        self.inner.lock().await.clone()
    }

    /// Read access without cloning
    pub async fn read(&self) -> MutexGuard<'_, Settings> {
        self.inner.lock().await
    }

    /// Mutate the settings and persist the result
    pub async fn update<R>(&self, f: impl FnOnce(&mut Settings) -> R) -> Result<R, SettingsError> {
        let mut settings = self.inner.lock().await;
        let result = f(&mut settings);
        settings.normalize();
        self.save(&settings)?;
        Ok(result)
    }

    /// Like [`SettingsStore::update`], for bookkeeping whose loss is tolerable
    pub async fn update_best_effort(&self, f: impl FnOnce(&mut Settings)) {
        if let Err(e) = self.update(f).await {
            warn!(error = %e, "Failed to save settings");
        }
    }

    /// Append a debug entry, a no-op unless debug mode is on
    pub async fn record_debug(&self, entry: DebugLogEntry) {
        if !self.inner.lock().await.debug_mode {
            return;
        }
        self.update_best_effort(|s| s.record_debug(entry)).await;
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::WriteFailed {
                path: path.clone(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(path, json).map_err(|e| SettingsError::WriteFailed {
            path: path.clone(),
            source: e,
        })
    }
}
