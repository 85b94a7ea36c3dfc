pub mod http;
#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::io::AsyncRead;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct StorageError(pub String);

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub struct UploadSource {
    pub reader: Box<dyn AsyncRead + Send + Sync + Unpin>,
    pub size: u64,
}

impl UploadSource {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        Self {
            reader: Box::new(std::io::Cursor::new(bytes)),
            size,
        }
    }
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn login(&self, credentials: &Credentials)
        -> Result<Box<dyn StorageSession>, StorageError>;
}

#[async_trait]
pub trait StorageSession: Send {
    /// `parent_id` of `None` means the account root.
    async fn upload(
        &mut self,
        parent_id: Option<&str>,
        filename: &str,
        modified: DateTime<Utc>,
        source: UploadSource,
    ) -> Result<String, StorageError>;

    async fn close(&mut self) -> Result<(), StorageError>;
}
