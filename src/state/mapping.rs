use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Links a source document to the remote post created from it
///
/// A mapping exists iff the document has been published successfully at
/// least once; its presence turns the next publish into an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMapping {
    pub source_path: String,
    /// The service's `filename_base` for the post
    pub remote_identifier: String,
    pub last_published_at: DateTime<Utc>,
}

/// Record the remote identifier for a source, replacing any previous row
pub fn upsert_mapping(
    mappings: &mut BTreeMap<String, PostMapping>,
    source_path: &str,
    remote_identifier: &str,
) -> PostMapping {
    let mapping = PostMapping {
        source_path: source_path.to_string(),
        remote_identifier: remote_identifier.to_string(),
        last_published_at: Utc::now(),
    };
    mappings.insert(source_path.to_string(), mapping.clone());
    mapping
}
