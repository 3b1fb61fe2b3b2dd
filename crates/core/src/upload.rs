//! Boundary checks for uploaded image files.
//!
//! The file type is sniffed from the leading bytes, never taken from the
//! client-supplied filename or content type.

use image::ImageFormat;

/// Default per-file size limit (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Maximum number of files accepted by a single batch upload.
pub const MAX_BATCH_UPLOADS: usize = 10;

/// Maximum length of `alt_text` and `caption`.
pub const MAX_TEXT_LENGTH: usize = 255;

/// Accepted extensions, in the order they are reported to clients.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpeg", "png", "jpg", "gif", "webp"];

/// One uploaded file as received at the boundary.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Filename as sent by the client. Only used for reporting.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageType {
    /// Extension used for the stored file.
    pub fn extension(self) -> &'static str {
        match self {
            ImageType::Jpeg => "jpg",
            ImageType::Png => "png",
            ImageType::Gif => "gif",
            ImageType::Webp => "webp",
        }
    }
}

/// Sniff an accepted image type from the file header.
pub fn detect_image_type(bytes: &[u8]) -> Option<ImageType> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Jpeg => Some(ImageType::Jpeg),
        ImageFormat::Png => Some(ImageType::Png),
        ImageFormat::Gif => Some(ImageType::Gif),
        ImageFormat::WebP => Some(ImageType::Webp),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("The image file is empty.")]
    Empty,

    #[error("The image may not be greater than {max_kb} kilobytes.")]
    TooLarge { max_kb: usize },

    #[error("The image must be a file of type: {}.", ACCEPTED_EXTENSIONS.join(", "))]
    UnsupportedType,

    #[error("The {field} may not be greater than {max} characters.")]
    TextTooLong { field: &'static str, max: usize },
}

/// Size and count limits applied to image uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    pub max_batch: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_batch: MAX_BATCH_UPLOADS,
        }
    }
}

impl UploadPolicy {
    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }

    /// Validate one file, returning its sniffed type.
    pub fn check(&self, upload: &Upload) -> Result<ImageType, UploadError> {
        if upload.bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                max_kb: self.max_bytes / 1024,
            });
        }
        detect_image_type(&upload.bytes).ok_or(UploadError::UnsupportedType)
    }

    /// Validate an optional free-text attribute (`alt_text`, `caption`).
    pub fn check_text(&self, field: &'static str, value: Option<&str>) -> Result<(), UploadError> {
        match value {
            Some(text) if text.chars().count() > MAX_TEXT_LENGTH => Err(UploadError::TextTooLong {
                field,
                max: MAX_TEXT_LENGTH,
            }),
            _ => Ok(()),
        }
    }
}
