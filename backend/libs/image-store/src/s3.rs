/// S3-backed image store
use crate::config::S3Config;
use crate::error::{ImageStoreError, Result};
use crate::{ImagePayload, ImageStore};
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone)]
pub struct S3ImageStore {
    client: Arc<Client>,
    config: S3Config,
}

impl S3ImageStore {
    /// Build a client from the default AWS credential chain
    pub async fn new(config: S3Config) -> Self {
        let timeouts = aws_config::timeout::TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(config.upload_timeout_secs))
            .build();

        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(config.region.clone()))
            .timeout_config(timeouts)
            .load()
            .await;

        tracing::info!(bucket = %config.bucket, region = %config.region, "S3 image store initialized");

        Self::with_client(Client::new(&aws_config), config)
    }

    pub fn with_client(client: Client, config: S3Config) -> Self {
        Self {
            client: Arc::new(client),
            config,
        }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Health check for S3 connectivity
    pub async fn health_check(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|e| ImageStoreError::Config(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    /// Upload one validated image, returning its object key and public URL
    async fn put(&self, image: ImagePayload, mime: mime::Mime) -> Result<(String, String)> {
        let key = self
            .config
            .object_key(&Uuid::new_v4().to_string(), &extension_for(&mime));
        let size = image.bytes.len();

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .content_type(mime.essence_str())
            .body(ByteStream::from(image.bytes))
            .send()
            .await
            .map_err(|e| {
                ImageStoreError::Upload(format!(
                    "{}: {}",
                    image.file_name,
                    DisplayErrorContext(&e)
                ))
            })?;

        tracing::debug!(%key, size, file_name = %image.file_name, "image stored");

        let url = self.config.public_url(&key);
        Ok((key, url))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ImageStoreError::Delete(format!("{}: {}", key, DisplayErrorContext(&e))))?;

        Ok(())
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn upload_one(&self, image: ImagePayload) -> Result<String> {
        let mime = image.validate(self.config.max_image_bytes)?;
        let (_, url) = self.put(image, mime).await?;
        Ok(url)
    }

    /// Uploads concurrently; on any failure the objects already stored by
    /// this batch are deleted and the first error is returned.
    async fn upload_many(&self, images: Vec<ImagePayload>) -> Result<Vec<String>> {
        let mut validated = Vec::with_capacity(images.len());
        for image in images {
            let mime = image.validate(self.config.max_image_bytes)?;
            validated.push((image, mime));
        }

        let results = join_all(
            validated
                .into_iter()
                .map(|(image, mime)| self.put(image, mime)),
        )
        .await;

        let mut stored = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(object) => stored.push(object),
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        if let Some(err) = first_error {
            for (key, _) in &stored {
                if let Err(delete_err) = self.delete(key).await {
                    tracing::warn!(%key, "orphaned image left after failed batch: {}", delete_err);
                }
            }
            return Err(err);
        }

        Ok(stored.into_iter().map(|(_, url)| url).collect())
    }
}

fn extension_for(mime: &mime::Mime) -> String {
    match mime.subtype().as_str() {
        "jpeg" | "pjpeg" => "jpg".to_string(),
        other => other.to_string(),
    }
}
