use super::{Credentials, StorageBackend, StorageError, StorageSession, UploadSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::io::AsyncReadExt;

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub parent_id: Option<String>,
    pub filename: String,
    pub modified: DateTime<Utc>,
    pub size: u64,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct Calls {
    pub logins: Vec<Credentials>,
    pub uploads: Vec<RecordedUpload>,
    pub closes: usize,
}

#[derive(Clone)]
pub struct MemoryStorage {
    calls: Arc<Mutex<Calls>>,
    file_id: String,
    login_error: Option<String>,
    login_delay: Option<Duration>,
    upload_error: Option<String>,
    upload_delay: Option<Duration>,
    close_error: Option<String>,
    close_hangs: bool,
}

impl MemoryStorage {
    pub fn new(file_id: &str) -> Self {
        Self {
            calls: Arc::default(),
            file_id: file_id.to_owned(),
            login_error: None,
            login_delay: None,
            upload_error: None,
            upload_delay: None,
            close_error: None,
            close_hangs: false,
        }
    }

    pub fn failing_login(mut self, message: &str) -> Self {
        self.login_error = Some(message.to_owned());
        self
    }

    pub fn slow_login(mut self, delay: Duration) -> Self {
        self.login_delay = Some(delay);
        self
    }

    pub fn failing_close(mut self, message: &str) -> Self {
        self.close_error = Some(message.to_owned());
        self
    }

    pub fn hanging_close(mut self) -> Self {
        self.close_hangs = true;
        self
    }

    pub fn failing_upload(mut self, message: &str) -> Self {
        self.upload_error = Some(message.to_owned());
        self
    }

    pub fn slow_upload(mut self, delay: Duration) -> Self {
        self.upload_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().unwrap()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "Proton Drive"
    }

    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn StorageSession>, StorageError> {
        self.calls().logins.push(credentials.clone());

        if let Some(delay) = self.login_delay {
            tokio::time::sleep(delay).await;
        }

        match &self.login_error {
            Some(message) => Err(StorageError(message.clone())),
            None => Ok(Box::new(MemorySession {
                storage: self.clone(),
            })),
        }
    }
}

struct MemorySession {
    storage: MemoryStorage,
}

#[async_trait]
impl StorageSession for MemorySession {
    async fn upload(
        &mut self,
        parent_id: Option<&str>,
        filename: &str,
        modified: DateTime<Utc>,
        mut source: UploadSource,
    ) -> Result<String, StorageError> {
        let mut bytes = Vec::new();
        source
            .reader
            .read_to_end(&mut bytes)
            .await
            .map_err(|err| StorageError(err.to_string()))?;

        self.storage.calls().uploads.push(RecordedUpload {
            parent_id: parent_id.map(str::to_owned),
            filename: filename.to_owned(),
            modified,
            size: source.size,
            bytes,
        });

        if let Some(delay) = self.storage.upload_delay {
            tokio::time::sleep(delay).await;
        }

        match &self.storage.upload_error {
            Some(message) => Err(StorageError(message.clone())),
            None => Ok(self.storage.file_id.clone()),
        }
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        self.storage.calls().closes += 1;

        if self.storage.close_hangs {
            std::future::pending::<()>().await;
        }

        match &self.storage.close_error {
            Some(message) => Err(StorageError(message.clone())),
            None => Ok(()),
        }
    }
}
