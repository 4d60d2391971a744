use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use super::CloudStorage;
use crate::error::{ArchiveError, ArchiveResult};

const DEFAULT_API_BASE: &str = "https://cloud-api.yandex.net/v1/disk";

/// Bound for every API call except the file PUT, which falls under the
/// upload timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Link returned by the upload and download endpoints.
#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

/// Error body of the Disk API.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    description: String,
}

/// Yandex Disk REST client.
pub struct YandexDisk {
    http: Client,
    token: String,
    api_base: String,
    request_timeout: Duration,
    upload_timeout: Duration,
}

impl YandexDisk {
    pub fn new(token: impl Into<String>, upload_timeout: Duration) -> ArchiveResult<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            upload_timeout,
        })
    }

    #[cfg(test)]
    fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    #[cfg(test)]
    fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn authorization(&self) -> String {
        format!("OAuth {}", self.token)
    }

    /// Creates `folder` if needed. An existing folder is not an error.
    pub async fn ensure_folder(&self, folder: &str) -> ArchiveResult<()> {
        let response = self
            .http
            .put(format!("{}/resources", self.api_base))
            .header(header::AUTHORIZATION, self.authorization())
            .query(&[("path", folder)])
            .timeout(self.request_timeout)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            debug!("📁 Folder {} already exists", folder);
            return Ok(());
        }

        check(response).await?;
        info!("📁 Folder {} created", folder);
        Ok(())
    }

    async fn upload_inner(&self, local: &Path, remote_path: &str) -> ArchiveResult<()> {
        let target: Link = check(
            self.http
                .get(format!("{}/resources/upload", self.api_base))
                .header(header::AUTHORIZATION, self.authorization())
                .query(&[("path", remote_path), ("overwrite", "true")])
                .timeout(self.request_timeout)
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;

        let file = tokio::fs::File::open(local)
            .await
            .map_err(|e| ArchiveError::StorageRequest(format!("{}: {}", local.display(), e)))?;
        let size = file
            .metadata()
            .await
            .map_err(|e| ArchiveError::StorageRequest(e.to_string()))?
            .len();

        check(
            self.http
                .put(&target.href)
                .header(header::CONTENT_LENGTH, size)
                .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
                .send()
                .await?,
        )
        .await?;

        debug!("☁️ Uploaded {} bytes to {}", size, remote_path);
        Ok(())
    }
}

#[async_trait]
impl CloudStorage for YandexDisk {
    async fn upload(&self, local: &Path, remote_path: &str) -> ArchiveResult<()> {
        tokio::time::timeout(self.upload_timeout, self.upload_inner(local, remote_path))
            .await
            .map_err(|_| {
                ArchiveError::StorageRequest(format!(
                    "upload of {} timed out after {}s",
                    remote_path,
                    self.upload_timeout.as_secs()
                ))
            })?
    }

    async fn download_link(&self, remote_path: &str) -> ArchiveResult<String> {
        let link: Link = check(
            self.http
                .get(format!("{}/resources/download", self.api_base))
                .header(header::AUTHORIZATION, self.authorization())
                .query(&[("path", remote_path)])
                .timeout(self.request_timeout)
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;

        Ok(link.href)
    }
}

/// Turns a non-success response into `StorageRequest` with the API's message.
async fn check(response: Response) -> ArchiveResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ArchiveError::StorageRequest(describe_failure(status, &body)))
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(api) if !api.error.is_empty() => format!("{} {}: {}", status, api.error, api.description),
        _ => format!("{} {}", status, body.trim()),
    }
}
