use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageStoreError>;

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("invalid image: {0}")]
    InvalidPayload(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("storage misconfigured: {0}")]
    Config(String),
}
