use std::sync::LazyLock;

use regex::Regex;

/// Extensions accepted as podcast audio
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "wav", "ogg", "aac", "flac", "opus"];

/// Extensions that are rejected outright, with a dedicated message
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "m4v", "wmv", "flv"];

/// Which syntax an audio reference was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `![[path.mp3]]`
    Embed,
    /// `[[path.mp3]]`
    WikiLink,
    /// `[label](path.mp3)`
    MarkdownLink,
}

/// An audio file referenced from document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioReference {
    /// Path exactly as written in the document
    pub path: String,
    pub kind: ReferenceKind,
}

fn extension_alternation() -> String {
    AUDIO_EXTENSIONS.join("|")
}

// Compiled once. `Regex` keeps no match state between calls.
static EMBED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)!\[\[([^\]\n]+\.(?:{}))\]\]",
        extension_alternation()
    ))
    .expect("embed pattern is valid")
});

static WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\[\[([^\]\n]+\.(?:{}))\]\]",
        extension_alternation()
    ))
    .expect("wiki link pattern is valid")
});

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\[[^\]\n]*\]\(([^)\n]+\.(?:{}))\)",
        extension_alternation()
    ))
    .expect("markdown link pattern is valid")
});

/// Find the audio file a document refers to
///
/// Pattern kinds are tried in priority order (embed, wiki link, markdown
/// link) over the whole text. The first kind with any match wins, even when a
/// lower priority reference appears earlier; only its first match is used.
pub fn detect(text: &str) -> Option<AudioReference> {
    let patterns: [(&Regex, ReferenceKind); 3] = [
        (&*EMBED, ReferenceKind::Embed),
        (&*WIKI_LINK, ReferenceKind::WikiLink),
        (&*MARKDOWN_LINK, ReferenceKind::MarkdownLink),
    ];

    patterns.into_iter().find_map(|(pattern, kind)| {
        pattern.captures(text).map(|captures| AudioReference {
            path: captures[1].trim().to_string(),
            kind,
        })
    })
}

/// Remove `![[...]]` audio embeds from the text
///
/// Wiki and markdown links are left alone; they may be ordinary links.
pub fn strip_embeds(text: &str) -> String {
    let mut current = text.to_string();
    // Removing one embed can join its neighbours into a new one
    while EMBED.is_match(&current) {
        current = EMBED.replace_all(&current, "").into_owned();
    }
    current
}

pub fn is_audio_extension(extension: &str) -> bool {
    let extension = extension.to_lowercase();
    AUDIO_EXTENSIONS.contains(&extension.as_str())
}

pub fn is_video_extension(extension: &str) -> bool {
    let extension = extension.to_lowercase();
    VIDEO_EXTENSIONS.contains(&extension.as_str())
}
