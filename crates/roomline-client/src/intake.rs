//! Attachment intake from the file picker and the clipboard.
//!
//! Both sources yield [`CandidateFile`]s.  Only image-typed candidates are
//! kept, and each is converted to a data URL on the blocking pool so large
//! files never stall the interaction path.  A file that fails conversion is
//! dropped from its batch; the rest of the batch still goes through.

use std::path::Path;

use tracing::debug;

use roomline_shared::data_url::{encode_image, is_image_type};
use roomline_shared::EncodeError;

/// Where a batch of candidates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeSource {
    FilePicker,
    Clipboard,
}

/// A file offered for attachment, with its declared content type.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.map(str::to_string),
            bytes,
        }
    }

    /// Read a file picked from disk; the declared type comes from its extension.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(Self {
            content_type: content_type_for_path(path),
            name,
            bytes,
        })
    }

    pub fn is_image(&self) -> bool {
        self.content_type.as_deref().is_some_and(is_image_type)
    }
}

/// Content type implied by a file extension, as a file picker would report it.
pub fn content_type_for_path(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// Convert one candidate, enforcing `max_size` on the raw bytes.
pub fn convert(file: &CandidateFile, max_size: usize) -> Result<String, EncodeError> {
    if !file.is_image() {
        return Err(EncodeError::NotAnImage);
    }
    encode_image(&file.bytes, max_size)
}

/// Filter and convert a batch synchronously. Failed files are dropped.
pub fn convert_batch(source: IntakeSource, files: &[CandidateFile], max_size: usize) -> Vec<String> {
    let mut encoded = Vec::with_capacity(files.len());
    for file in files {
        if !file.is_image() {
            debug!(source = ?source, file = %file.name, "Skipping non-image candidate");
            continue;
        }
        match convert(file, max_size) {
            Ok(url) => encoded.push(url),
            Err(e) => {
                debug!(source = ?source, file = %file.name, error = %e, "Dropping unconvertible file");
            }
        }
    }
    encoded
}

/// Filter and convert a batch on the blocking pool.
pub async fn encode_batch(
    source: IntakeSource,
    files: Vec<CandidateFile>,
    max_size: usize,
) -> Vec<String> {
    if files.is_empty() {
        return Vec::new();
    }
    match tokio::task::spawn_blocking(move || convert_batch(source, &files, max_size)).await {
        Ok(encoded) => encoded,
        Err(e) => {
            tracing::error!(error = %e, "Attachment conversion task failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// PNG signature followed by the start of an IHDR chunk; enough for sniffing.
    pub fn png_bytes(tag: u8) -> Vec<u8> {
        let mut bytes = vec![
            0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13, b'I', b'H', b'D', b'R',
        ];
        bytes.push(tag);
        bytes
    }
}
