use super::{Credentials, StorageBackend, StorageError, StorageSession, UploadSource};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{header::CONTENT_LENGTH, Body, Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Storage account reachable over a JSON/bearer-token HTTP API.
pub struct HttpStorage {
    client: Client,
    api_url: String,
    name: String,
}

impl HttpStorage {
    pub fn new(
        api_url: &str,
        name: impl Into<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_url: api_url.trim_end_matches('/').to_owned(),
            name: name.into(),
        })
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(rename = "fileID")]
    file_id: String,
}

#[async_trait]
impl StorageBackend for HttpStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn StorageSession>, StorageError> {
        let response = self
            .client
            .post(format!("{}/auth/login", self.api_url))
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await?;

        let login: LoginResponse = check_status(response).await?.json().await?;
        debug!("Logged in to {} as {}", self.name, credentials.username);

        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            api_url: self.api_url.clone(),
            access_token: login.access_token,
        }))
    }
}

struct HttpSession {
    client: Client,
    api_url: String,
    access_token: String,
}

#[async_trait]
impl StorageSession for HttpSession {
    async fn upload(
        &mut self,
        parent_id: Option<&str>,
        filename: &str,
        modified: DateTime<Utc>,
        source: UploadSource,
    ) -> Result<String, StorageError> {
        let modified_at = modified.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut query = vec![("name", filename), ("modifiedAt", modified_at.as_str())];
        if let Some(parent_id) = parent_id {
            query.push(("parentID", parent_id));
        }

        let response = self
            .client
            .post(format!("{}/files", self.api_url))
            .bearer_auth(&self.access_token)
            .query(&query)
            .header(CONTENT_LENGTH, source.size)
            .body(Body::wrap_stream(ReaderStream::new(source.reader)))
            .send()
            .await?;

        let uploaded: UploadResponse = check_status(response).await?.json().await?;

        Ok(uploaded.file_id)
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        let response = self
            .client
            .post(format!("{}/auth/logout", self.api_url))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        check_status(response).await?;

        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let text = response.text().await.unwrap_or_default();
        Err(StorageError(format!("{status}: {text}")))
    }
}
