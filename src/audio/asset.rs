use crate::error::AudioError;
use crate::vault::{Vault, VaultEntry, VaultFile, normalize, parent_folder};

use super::detect::{AudioReference, is_audio_extension, is_video_extension};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// An audio file that was found in the vault and passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAsset {
    /// Path as written in the document
    pub source_path: String,
    pub file: VaultFile,
    pub extension: String,
    pub byte_size: u64,
    pub mime_type: &'static str,
}

impl AudioAsset {
    pub fn new(reference: &AudioReference, file: VaultFile) -> Self {
        Self {
            source_path: reference.path.clone(),
            extension: file.extension.clone(),
            byte_size: file.size,
            mime_type: mime_type_for(&file.extension),
            file,
        }
    }
}

/// Find the file an audio reference points at
///
/// The path is tried from the vault root first, then relative to the folder
/// of the document that contains the reference.
pub fn resolve<V: Vault + ?Sized>(
    vault: &V,
    reference: &AudioReference,
    document_path: &str,
) -> Option<VaultFile> {
    let direct = normalize(&reference.path);
    let candidates = [
        direct.clone(),
        normalize(&format!("{}/{}", parent_folder(document_path), direct)),
    ];

    candidates
        .iter()
        .find_map(|candidate| match vault.entry(candidate) {
            Some(VaultEntry::File(file)) => Some(file),
            _ => None,
        })
}

/// Check type and size of an audio file before it is uploaded
pub fn validate(file: &VaultFile, max_size_mb: u64) -> Result<(), AudioError> {
    if is_video_extension(&file.extension) {
        return Err(AudioError::VideoNotSupported {
            extension: file.extension.clone(),
        });
    }

    if !is_audio_extension(&file.extension) {
        return Err(AudioError::UnsupportedFormat {
            extension: file.extension.clone(),
        });
    }

    if file.size > max_size_mb.saturating_mul(1024 * 1024) {
        return Err(AudioError::TooLarge {
            size_mb: file.size as f64 / BYTES_PER_MB,
            max_mb: max_size_mb,
        });
    }

    Ok(())
}

/// Map audio file extensions to MIME types
pub fn mime_type_for(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        "opus" => "audio/opus",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        _ => "audio/mpeg",
    }
}
