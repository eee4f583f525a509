// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reading and rewriting the `---` delimited metadata block of a document.
//!
//! The block is treated as a flat list of `key: value` lines. Only the keys
//! this crate manages are ever changed; everything else is copied verbatim.

/// Name of the destination the document was last published to
pub const DESTINATION_KEY: &str = "destination-name";

/// Public or internal URL of the published post
pub const URL_KEY: &str = "canonical-url";

/// Editorial stage of the post (magazine destinations)
pub const EDITING_STATUS_KEY: &str = "editing-status";

const DELIMITER: &str = "---";

/// Parsed metadata block and the text that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter<'a> {
    /// `key: value` pairs in document order, quotes removed
    pub entries: Vec<(String, String)>,
    pub body: &'a str,
}

impl Frontmatter<'_> {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Split a document into its metadata block contents and body
///
/// Returns `None` unless the document starts with a delimiter line and the
/// block is closed by another one.
fn split_block(document: &str) -> Option<(&str, &str)> {
    let rest = document
        .strip_prefix("---\n")
        .or_else(|| document.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn line_key(line: &str) -> Option<&str> {
    line.split_once(':').map(|(key, _)| key.trim())
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn unquote(raw: &str) -> String {
    let raw = raw.trim();
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        if let Ok(parsed) = serde_json::from_str::<String>(raw) {
            return parsed;
        }
        return raw[1..raw.len() - 1].to_string();
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].replace("''", "'");
    }
    raw.to_string()
}

/// Parse the metadata block of a document
///
/// A document without a block yields no entries and the whole text as body.
pub fn read_metadata(document: &str) -> Frontmatter<'_> {
    let Some((block, body)) = split_block(document) else {
        return Frontmatter {
            entries: Vec::new(),
            body: document,
        };
    };

    let entries = block
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            (!key.is_empty() && !key.starts_with('#')).then(|| (key.to_string(), unquote(value)))
        })
        .collect();

    Frontmatter { entries, body }
}

/// Line terminator used by the document, judged by its first line
fn line_ending(document: &str) -> &'static str {
    match document.find('\n') {
        Some(pos) if document[..pos].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

/// Record where a document was published in its metadata block
///
/// Managed keys are replaced in place or appended at the end of the block.
/// With no `editing_status`, an existing status line is left as it is. A
/// block is created when the document has none; the body is never touched.
pub fn rewrite_metadata(
    document: &str,
    destination_name: &str,
    url: &str,
    editing_status: Option<&str>,
) -> String {
    let managed = [
        (DESTINATION_KEY, Some(destination_name)),
        (URL_KEY, Some(url)),
        (EDITING_STATUS_KEY, editing_status),
    ];

    let (block, body) = split_block(document).unwrap_or(("", document));
    let eol = line_ending(document);

    let mut seen = [false; 3];
    let mut lines: Vec<String> = Vec::new();

    // Lines keep their own terminator unless rewritten
    for raw in block.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\r', '\n']);
        let replacement = line_key(line).and_then(|key| {
            managed
                .iter()
                .position(|(managed_key, _)| *managed_key == key)
        });

        match replacement {
            Some(index) => {
                seen[index] = true;
                match managed[index].1 {
                    Some(value) => lines.push(format!(
                        "{}: {}{}",
                        managed[index].0,
                        quote(value),
                        eol
                    )),
                    None => lines.push(raw.to_string()),
                }
            }
            None => lines.push(raw.to_string()),
        }
    }

    for (index, (key, value)) in managed.iter().enumerate() {
        if let (false, Some(value)) = (seen[index], value) {
            lines.push(format!("{}: {}{}", key, quote(value), eol));
        }
    }

    let mut output = String::with_capacity(document.len() + 128);
    output.push_str(DELIMITER);
    output.push_str(eol);
    for line in &lines {
        output.push_str(line);
    }
    output.push_str(DELIMITER);
    output.push_str(eol);
    output.push_str(body);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_block_when_missing() {
        let document = "# Title\n\nBody text.\n";
        let rewritten = rewrite_metadata(document, "blog", "https://x/y", Some("feedback"));

        assert_eq!(
            rewritten,
            "---\ndestination-name: \"blog\"\ncanonical-url: \"https://x/y\"\n\
             editing-status: \"feedback\"\n---\n# Title\n\nBody text.\n"
        );

        let parsed = read_metadata(&rewritten);
        assert_eq!(
            parsed.entries,
            vec![
                ("destination-name".to_string(), "blog".to_string()),
                ("canonical-url".to_string(), "https://x/y".to_string()),
                ("editing-status".to_string(), "feedback".to_string()),
            ]
        );
        assert_eq!(parsed.body, document);
    }

    #[test]
    fn rerun_updates_only_changed_key() {
        let document = "Body\n";
        let first = rewrite_metadata(document, "blog", "https://x/y", Some("feedback"));
        let second = rewrite_metadata(&first, "blog", "https://x/z", Some("feedback"));

        let parsed = read_metadata(&second);
        assert_eq!(parsed.get(URL_KEY), Some("https://x/z"));
        assert_eq!(parsed.get(DESTINATION_KEY), Some("blog"));
        assert_eq!(parsed.get(EDITING_STATUS_KEY), Some("feedback"));
        assert_eq!(parsed.entries.len(), 3);
        assert_eq!(parsed.body, document);
    }

    #[test]
    fn keeps_unmanaged_lines_in_order() {
        let document = "---\ntitle: My Post\ncanonical-url: old\ntags: [a, b]\n---\nBody\n";
        let rewritten = rewrite_metadata(document, "pod", "https://new", None);

        assert_eq!(
            rewritten,
            "---\ntitle: My Post\ncanonical-url: \"https://new\"\ntags: [a, b]\n\
             destination-name: \"pod\"\n---\nBody\n"
        );
    }

    #[test]
    fn missing_status_leaves_existing_value() {
        let document = "---\nediting-status: \"submission\"\n---\n";
        let rewritten = rewrite_metadata(document, "pod", "https://u", None);
        let parsed = read_metadata(&rewritten);
        assert_eq!(parsed.get(EDITING_STATUS_KEY), Some("submission"));
        assert!(rewritten.starts_with("---\nediting-status: \"submission\"\n"));
    }

    #[test]
    fn values_are_escaped() {
        let rewritten = rewrite_metadata("", "pod", "https://x/\"q\"", None);
        let parsed = read_metadata(&rewritten);
        assert_eq!(parsed.get(URL_KEY), Some("https://x/\"q\""));
    }

    #[test]
    fn unclosed_block_is_treated_as_body() {
        let document = "---\ntitle: x\nno closing delimiter\n";
        let parsed = read_metadata(document);
        assert!(parsed.entries.is_empty());
        assert_eq!(parsed.body, document);

        let rewritten = rewrite_metadata(document, "pod", "u", None);
        assert!(rewritten.ends_with(document));
    }

    #[test]
    fn reads_crlf_blocks_and_plain_values() {
        let parsed = read_metadata("---\r\nkey: plain value\r\nother: 'single'\r\n---\r\nbody");
        assert_eq!(parsed.get("key"), Some("plain value"));
        assert_eq!(parsed.get("other"), Some("single"));
        assert_eq!(parsed.body, "body");
    }

    #[test]
    fn crlf_block_keeps_its_line_endings() {
        let document = "---\r\nauthor: sam\r\ncanonical-url: \"old\"\r\n---\r\nBody\r\n";
        let rewritten = rewrite_metadata(document, "pod", "https://x/y", None);

        assert_eq!(
            rewritten,
            "---\r\nauthor: sam\r\ncanonical-url: \"https://x/y\"\r\n\
             destination-name: \"pod\"\r\n---\r\nBody\r\n"
        );
        assert!(!rewritten.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn new_block_follows_crlf_body() {
        let rewritten = rewrite_metadata("Body\r\n", "pod", "u", None);
        assert_eq!(
            rewritten,
            "---\r\ndestination-name: \"pod\"\r\ncanonical-url: \"u\"\r\n---\r\nBody\r\n"
        );
    }
}
