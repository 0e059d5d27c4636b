/// Image storage for Family Moments services
///
/// Provides the `ImageStore` abstraction used by the post service, the S3
/// implementation behind it, and the payload type handed over by the HTTP layer.
use async_trait::async_trait;

pub mod config;
pub mod error;
pub mod s3;

pub use config::S3Config;
pub use error::{ImageStoreError, Result};
pub use s3::S3ImageStore;

/// Raster image subtypes accepted for upload. SVG is excluded since it can carry scripts.
pub const RASTER_SUBTYPES: [&str; 6] = ["jpeg", "png", "gif", "webp", "heic", "heif"];

/// A single image as received from a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Original file name, used only for logging
    pub file_name: String,
    /// MIME type reported by the client (e.g. `image/jpeg`)
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Reject empty payloads, non-image content types and oversized files
    pub fn validate(&self, max_bytes: usize) -> Result<mime::Mime> {
        if self.bytes.is_empty() {
            return Err(ImageStoreError::InvalidPayload(format!(
                "{} is empty",
                self.file_name
            )));
        }

        if self.bytes.len() > max_bytes {
            return Err(ImageStoreError::InvalidPayload(format!(
                "{} is {} bytes, limit is {}",
                self.file_name,
                self.bytes.len(),
                max_bytes
            )));
        }

        let mime: mime::Mime = self.content_type.parse().map_err(|_| {
            ImageStoreError::InvalidPayload(format!(
                "{} has an unparseable content type '{}'",
                self.file_name, self.content_type
            ))
        })?;

        if mime.type_() != mime::IMAGE {
            return Err(ImageStoreError::InvalidPayload(format!(
                "{} is not an image ({})",
                self.file_name, self.content_type
            )));
        }

        if !RASTER_SUBTYPES.contains(&mime.subtype().as_str()) {
            return Err(ImageStoreError::InvalidPayload(format!(
                "{} has an unsupported image type ({})",
                self.file_name, self.content_type
            )));
        }

        Ok(mime)
    }
}

/// Object storage for post images.
///
/// Every successful upload yields one public URL. Batch uploads keep the
/// input order and either store every image or none of them.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload_one(&self, image: ImagePayload) -> Result<String>;

    async fn upload_many(&self, images: Vec<ImagePayload>) -> Result<Vec<String>> {
        let mut urls = Vec::with_capacity(images.len());
        for image in images {
            urls.push(self.upload_one(image).await?);
        }
        Ok(urls)
    }
}
