//! Access to the host's document store.
//!
//! Paths are vault-relative strings using `/` as separator, the way documents
//! reference each other.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// A regular file inside the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultFile {
    /// Vault-relative path
    pub path: String,
    /// File name including extension
    pub name: String,
    /// Lower-cased extension without the dot (empty if none)
    pub extension: String,
    /// Size in bytes
    pub size: u64,
}

/// What lives at a vault path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEntry {
    File(VaultFile),
    Folder,
}

/// Storage operations the publish pipeline needs from its host
#[async_trait]
pub trait Vault: Send + Sync {
    /// Look up a vault-relative path
    fn entry(&self, path: &str) -> Option<VaultEntry>;

    async fn read_bytes(&self, path: &str) -> std::io::Result<Vec<u8>>;

    async fn read_text(&self, path: &str) -> std::io::Result<String>;

    async fn write_text(&self, path: &str, contents: &str) -> std::io::Result<()>;
}

/// Vault backed by a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &str) -> PathBuf {
        self.root.join(normalize(path))
    }

    /// Convert a filesystem path below the root back into a vault path
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

#[async_trait]
impl Vault for FsVault {
    fn entry(&self, path: &str) -> Option<VaultEntry> {
        let absolute = self.absolute(path);
        let metadata = std::fs::metadata(&absolute).ok()?;

        if metadata.is_dir() {
            return Some(VaultEntry::Folder);
        }
        if !metadata.is_file() {
            return None;
        }

        let normalized = normalize(path);
        let name = normalized
            .rsplit('/')
            .next()
            .unwrap_or(normalized.as_str())
            .to_string();

        Some(VaultEntry::File(VaultFile {
            extension: extension_of(&name),
            path: normalized,
            name,
            size: metadata.len(),
        }))
    }

    async fn read_bytes(&self, path: &str) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.absolute(path)).await
    }

    async fn read_text(&self, path: &str) -> std::io::Result<String> {
        tokio::fs::read_to_string(self.absolute(path)).await
    }

    async fn write_text(&self, path: &str, contents: &str) -> std::io::Result<()> {
        tokio::fs::write(self.absolute(path), contents).await
    }
}

/// Strip leading separators and `.` segments, resolve `..` lexically
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Folder containing a vault path ("" for the vault root)
pub fn parent_folder(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(pos) => normalized[..pos].to_string(),
        None => String::new(),
    }
}

/// Lower-cased extension of a file name
pub fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(pos) if pos + 1 < name.len() => name[pos + 1..].to_lowercase(),
        _ => String::new(),
    }
}

/// File name without its extension
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}
