//! Documents chosen at the selection surface.
//!
//! Filtering happens here, when the file is picked, so an unsupported file
//! never reaches a draft and never costs an upload.

use crate::error::{ClientError, ValidationError};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// A file the user picked for conversion.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentFile {
    name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl fmt::Debug for DocumentFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl DocumentFile {
    /// Wrap in-memory content. The content type is guessed from the name.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = guess_content_type(&name).to_string();
        Self {
            name,
            content_type,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Read a file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| ClientError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        debug!("Read {} ({} bytes)", name, bytes.len());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lower-case extension without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }
}

/// Check `file` against the accepted extensions.
///
/// A file passes when its extension is accepted, or when it has no usable
/// extension but a content type matching an accepted one.
pub fn accept(file: &DocumentFile, accepted: &[String]) -> Result<(), ValidationError> {
    let by_extension = file
        .extension()
        .is_some_and(|ext| accepted.iter().any(|a| *a == ext));
    let by_type = file.extension().is_none()
        && accepted
            .iter()
            .any(|a| guess_content_type_for_ext(a) == file.content_type());

    if by_extension || by_type {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedFile {
            name: file.name().to_string(),
            accepted: accepted
                .iter()
                .map(|a| format!(".{a}"))
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

fn guess_content_type(name: &str) -> &'static str {
    match Path::new(name).extension() {
        Some(ext) => guess_content_type_for_ext(&ext.to_string_lossy().to_ascii_lowercase()),
        None => "application/octet-stream",
    }
}

fn guess_content_type_for_ext(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "epub" => "application/epub+zip",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
