//! Image attachments for signatures.
//!
//! # Responsibility
//! - Accept small image uploads and store them under generated names.
//! - Serve stored images back with a content type.
//!
//! # Invariants
//! - Stored names are `<uuid>.<ext>`; caller-provided names never reach the
//!   filesystem except for their extension.
//! - Reads strip directory components, so lookups cannot leave the store.

use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Largest accepted upload.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Content types accepted on upload.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

const DEFAULT_EXTENSION: &str = "png";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Upload/read failure.
#[derive(Debug)]
pub enum UploadError {
    UnsupportedType(String),
    TooLarge { size: usize, max: usize },
    NotFound(String),
    Io(std::io::Error),
}

impl Display for UploadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedType(content_type) => write!(
                f,
                "unsupported image type `{content_type}`; use JPG, PNG, GIF, WebP or SVG"
            ),
            Self::TooLarge { size, max } => {
                write!(f, "image is {size} bytes; the limit is {max} bytes")
            }
            Self::NotFound(name) => write!(f, "image not found: {name}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UploadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for UploadError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Image read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Directory-backed image store.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Creates a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validates and stores an upload, returning the generated filename.
    pub fn save(
        &self,
        original_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, UploadError> {
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            warn!(
                "event=upload module=upload status=rejected reason=unsupported_type content_type={content_type}"
            );
            return Err(UploadError::UnsupportedType(content_type.to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            warn!(
                "event=upload module=upload status=rejected reason=too_large size={}",
                bytes.len()
            );
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                max: MAX_IMAGE_BYTES,
            });
        }

        std::fs::create_dir_all(&self.dir)?;
        let filename = format!("{}.{}", Uuid::new_v4(), extension_of(original_name));
        std::fs::write(self.dir.join(&filename), bytes)?;

        info!(
            "event=upload module=upload status=ok size={} content_type={content_type}",
            bytes.len()
        );
        Ok(filename)
    }

    /// Reads a stored image. Directory components in `name` are ignored.
    pub fn load(&self, name: &str) -> Result<StoredImage, UploadError> {
        let safe_name = Path::new(name)
            .file_name()
            .and_then(|value| value.to_str())
            .ok_or_else(|| UploadError::NotFound(name.to_string()))?;

        let bytes = match std::fs::read(self.dir.join(safe_name)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(UploadError::NotFound(safe_name.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        Ok(StoredImage {
            filename: safe_name.to_string(),
            content_type: content_type_for(safe_name),
            bytes,
        })
    }

    /// Deletes a stored image. Directory components in `name` are ignored.
    pub fn remove(&self, name: &str) -> Result<(), UploadError> {
        let safe_name = Path::new(name)
            .file_name()
            .and_then(|value| value.to_str())
            .ok_or_else(|| UploadError::NotFound(name.to_string()))?;
        match std::fs::remove_file(self.dir.join(safe_name)) {
            Ok(()) => {
                info!("event=upload_remove module=upload status=ok");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(UploadError::NotFound(safe_name.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Maps a filename extension to its image content type.
pub fn content_type_for(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|value| value.to_str())
        .filter(|value| !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
