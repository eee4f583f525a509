//! Publish options and the pipeline that sends a document to a destination

mod form;
mod orchestrator;

pub use form::{
    EditingStatus, OptionIntent, PublishDraft, PublishOptions, build_publish_fields, slugify,
};
pub use orchestrator::{PublishOutcome, PublishRequest, Publisher, canonical_url};
