use std::fs;
use std::path::Path;

use reqwest::multipart::Part;

use crate::http::error::ApiError;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// A file sent as the single part of a multipart upload.
#[derive(Clone)]
pub struct FileUpload {
    bytes: Vec<u8>,
    file_name: String,
    mime_type: String,
}

impl FileUpload {
    /// Form field name of the uploaded part.
    pub const FIELD_NAME: &'static str = "file-to-be-uploaded";

    /// Read a file from disk. Without an explicit mime type one is guessed
    /// from the file extension.
    pub fn from_path(path: &Path, mime_type: Option<&str>) -> Result<Self, ApiError> {
        let bytes = fs::read(path)
            .map_err(|e| ApiError::Io(format!("failed to read {}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_bytes(&file_name, bytes, mime_type))
    }

    /// Wrap bytes already in memory.
    pub fn from_bytes(file_name: &str, bytes: Vec<u8>, mime_type: Option<&str>) -> Self {
        let mime_type = mime_type
            .map(str::to_string)
            .unwrap_or_else(|| guess_mime_type(file_name).to_string());
        FileUpload {
            bytes,
            file_name: file_name.to_string(),
            mime_type,
        }
    }

    /// File name sent with the part.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size of the file in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn into_part(self) -> Result<Part, ApiError> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime_type)
            .map_err(|e| ApiError::Io(format!("invalid mime type '{}': {e}", self.mime_type)))
    }
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Guess a mime type from the file extension.
pub fn guess_mime_type(file_name: &str) -> &'static str {
    let extension = match file_name.rsplit_once('.') {
        Some((_, extension)) => extension.to_ascii_lowercase(),
        None => return FALLBACK_MIME_TYPE,
    };
    match extension.as_str() {
        "txt" => "text/plain",
        "csv" => "text/csv",
        "htm" | "html" => "text/html",
        "xml" => "application/xml",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => FALLBACK_MIME_TYPE,
    }
}
