//! # File Metadata
//!
//! `FileMetadata` is what callers see; `FileRecord` is what a backend
//! persists. Both are keyed by the content hash of `data`.

use serde::{Deserialize, Serialize};

use super::hash::ContentHash;

/// Metadata describing a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    pub hash: ContentHash,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

/// A stored file: metadata plus payload bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub metadata: FileMetadata,
    pub data: Vec<u8>,
}

impl FileRecord {
    /// Build a record for a freshly uploaded payload.
    ///
    /// The hash and size are always derived from `data`.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        let metadata = FileMetadata {
            name: name.into(),
            size: data.len() as u64,
            hash: ContentHash::of(&data),
            content_type: content_type.into(),
        };
        Self { metadata, data }
    }

    pub fn hash(&self) -> &ContentHash {
        &self.metadata.hash
    }
}

/// Guess a content type from a file name's extension.
///
/// Returns `None` for unknown or missing extensions.
pub fn content_type_for(name: &str) -> Option<&'static str> {
    let (_, extension) = name.rsplit_once('.')?;

    let content_type = match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "txt" | "text" => "text/plain",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        "zip" => "application/zip",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(content_type)
}
