use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::FormFields;
use crate::state::{Destination, PostMapping, PublishDefaults};

/// Editorial stage of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditingStatus {
    Draft,
    Feedback,
    Submission,
}

impl EditingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EditingStatus::Draft => "draft",
            EditingStatus::Feedback => "feedback",
            EditingStatus::Submission => "submission",
        }
    }

    /// Status implied by the visibility toggles
    pub fn from_visibility(publish_public: bool, publish_internal: bool) -> Self {
        if publish_public {
            EditingStatus::Submission
        } else if publish_internal {
            EditingStatus::Feedback
        } else {
            EditingStatus::Draft
        }
    }
}

impl fmt::Display for EditingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(EditingStatus::Draft),
            "feedback" => Ok(EditingStatus::Feedback),
            "submission" => Ok(EditingStatus::Submission),
            other => Err(format!(
                "unknown editing status '{}' (expected draft, feedback or submission)",
                other
            )),
        }
    }
}

/// A single user change to the publish options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionIntent {
    SetInternal(bool),
    SetPublic(bool),
    SetExcerpt(bool),
    SetHidden(bool),
    SetTags(String),
    SetTemplate(String),
    /// Explicit status; only honoured for magazine destinations
    ChooseEditingStatus(EditingStatus),
    ClearEditingStatus,
    SetRemoveSilence(bool),
    SetIncludeInPodcast(bool),
    SetPublishImmediately(bool),
    SetTranscribe(bool),
}

/// Options chosen for one publish
///
/// Built from the stored defaults and changed only through [`apply`], which
/// keeps `excerpt` and `hidden` mutually exclusive.
///
/// [`apply`]: PublishOptions::apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    publish_internal: bool,
    publish_public: bool,
    excerpt: bool,
    hidden: bool,
    tags: String,
    template: String,
    editing_status: Option<EditingStatus>,
    remove_silence: bool,
    include_in_podcast: bool,
    publish_immediately: bool,
    transcribe: bool,
    pub ai_model: Option<String>,
    pub ai_provider: Option<String>,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self::from_defaults(&PublishDefaults::default())
    }
}

impl PublishOptions {
    pub fn from_defaults(defaults: &PublishDefaults) -> Self {
        Self {
            publish_internal: defaults.publish_internal,
            publish_public: defaults.publish_public,
            excerpt: defaults.excerpt && !defaults.hidden,
            hidden: defaults.hidden,
            tags: defaults.tags.clone(),
            template: defaults.template.clone(),
            editing_status: None,
            remove_silence: defaults.remove_silence,
            include_in_podcast: defaults.include_in_podcast,
            publish_immediately: defaults.publish_immediately,
            transcribe: defaults.transcribe,
            ai_model: defaults.ai_model.clone(),
            ai_provider: defaults.ai_provider.clone(),
        }
    }

    /// Apply one intent, returning the new options
    pub fn apply(mut self, intent: OptionIntent) -> Self {
        match intent {
            OptionIntent::SetInternal(value) => self.publish_internal = value,
            OptionIntent::SetPublic(value) => self.publish_public = value,
            OptionIntent::SetExcerpt(value) => {
                self.excerpt = value;
                if value {
                    self.hidden = false;
                }
            }
            OptionIntent::SetHidden(value) => {
                self.hidden = value;
                if value {
                    self.excerpt = false;
                }
            }
            OptionIntent::SetTags(tags) => self.tags = tags,
            OptionIntent::SetTemplate(template) => self.template = template,
            OptionIntent::ChooseEditingStatus(status) => self.editing_status = Some(status),
            OptionIntent::ClearEditingStatus => self.editing_status = None,
            OptionIntent::SetRemoveSilence(value) => self.remove_silence = value,
            OptionIntent::SetIncludeInPodcast(value) => self.include_in_podcast = value,
            OptionIntent::SetPublishImmediately(value) => self.publish_immediately = value,
            OptionIntent::SetTranscribe(value) => self.transcribe = value,
        }
        self
    }

    /// Apply a sequence of intents in order
    pub fn apply_all(self, intents: impl IntoIterator<Item = OptionIntent>) -> Self {
        intents.into_iter().fold(self, Self::apply)
    }

    pub fn publish_internal(&self) -> bool {
        self.publish_internal
    }

    pub fn publish_public(&self) -> bool {
        self.publish_public
    }

    pub fn excerpt(&self) -> bool {
        self.excerpt
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn tags(&self) -> &str {
        &self.tags
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn remove_silence(&self) -> bool {
        self.remove_silence
    }

    pub fn include_in_podcast(&self) -> bool {
        self.include_in_podcast
    }

    pub fn publish_immediately(&self) -> bool {
        self.publish_immediately
    }

    pub fn transcribe(&self) -> bool {
        self.transcribe
    }

    /// Explicitly chosen status, if any
    pub fn chosen_editing_status(&self) -> Option<EditingStatus> {
        self.editing_status
    }

    /// Status sent to a destination
    ///
    /// Magazine destinations use the explicit choice when one was made;
    /// everything else derives it from the visibility toggles.
    pub fn editing_status_for(&self, destination: &Destination) -> EditingStatus {
        match (destination.magazine_mode, self.editing_status) {
            (true, Some(status)) => status,
            _ => EditingStatus::from_visibility(self.publish_public, self.publish_internal),
        }
    }
}

/// Turn a title into a URL-safe identifier
///
/// Lower-cases, collapses every run of non-alphanumeric characters into a
/// single `-` and trims dashes from both ends.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_separator = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            slug.push('-');
            last_was_separator = true;
        }
    }

    slug.trim_matches('-').to_string()
}

/// Everything the publish form is built from
#[derive(Debug, Clone)]
pub struct PublishDraft<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    /// Document text with audio embeds removed
    pub markdown: &'a str,
    pub options: &'a PublishOptions,
    pub editing_status: EditingStatus,
    pub destination_name: &'a str,
}

fn flag(value: bool) -> String {
    let text = if value { "true" } else { "false" };
    text.to_string()
}

/// Build the ordered fields of a publish request
///
/// An existing mapping adds `filename_base`, which makes the request an
/// update. Audio fields are present only when an audio file was uploaded.
pub fn build_publish_fields(
    draft: &PublishDraft<'_>,
    mapping: Option<&PostMapping>,
    audio_filename: Option<&str>,
) -> FormFields {
    let options = draft.options;
    let mut fields: FormFields = vec![
        ("title".to_string(), draft.title.to_string()),
        ("slug".to_string(), draft.slug.to_string()),
        ("markdown".to_string(), draft.markdown.to_string()),
        ("publish_internal".to_string(), flag(options.publish_internal)),
        ("publish_public".to_string(), flag(options.publish_public)),
        ("excerpt".to_string(), flag(options.excerpt)),
        ("hidden".to_string(), flag(options.hidden)),
        ("tags".to_string(), options.tags.clone()),
        ("post_template".to_string(), options.template.clone()),
        (
            "editing_status".to_string(),
            draft.editing_status.as_str().to_string(),
        ),
        ("shortname".to_string(), draft.destination_name.to_string()),
    ];

    if let Some(mapping) = mapping {
        fields.push((
            "filename_base".to_string(),
            mapping.remote_identifier.clone(),
        ));
    }

    if let Some(audio_filename) = audio_filename {
        fields.push(("audio_file".to_string(), audio_filename.to_string()));
        fields.push((
            "include_in_podcast".to_string(),
            flag(options.include_in_podcast),
        ));
        fields.push((
            "publish_immediately".to_string(),
            flag(options.publish_immediately),
        ));
    }

    fields
}
