/// S3 configuration for post image storage
use serde::{Deserialize, Serialize};

const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Base URL for public access (bucket endpoint or CDN domain)
    pub base_url: String,
    /// Key prefix under which post images are stored
    pub key_prefix: String,
    /// Per-operation timeout for S3 calls
    pub upload_timeout_secs: u64,
    /// Largest accepted image
    pub max_image_bytes: usize,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: "family-moments".to_string(),
            region: "ap-northeast-2".to_string(),
            base_url: "https://family-moments.s3.ap-northeast-2.amazonaws.com".to_string(),
            key_prefix: "posts".to_string(),
            upload_timeout_secs: 30,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl S3Config {
    /// Load S3 configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bucket: std::env::var("S3_BUCKET").unwrap_or(defaults.bucket),
            region: std::env::var("AWS_REGION").unwrap_or(defaults.region),
            base_url: std::env::var("S3_BASE_URL").unwrap_or(defaults.base_url),
            key_prefix: std::env::var("S3_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            upload_timeout_secs: std::env::var("S3_UPLOAD_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.upload_timeout_secs),
            max_image_bytes: std::env::var("MAX_IMAGE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_image_bytes),
        }
    }

    /// Object key for a new image with the given extension
    pub fn object_key(&self, id: &str, extension: &str) -> String {
        let prefix = self.key_prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{}.{}", id, extension)
        } else {
            format!("{}/{}.{}", prefix, id, extension)
        }
    }

    /// Public URL for an object key
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}
