use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio_util::io::ReaderStream;
use url::Url;

use crate::filename::content_disposition_filename;
use crate::wire::{error_detail, parse_status, parse_submit};
use crate::{ClientError, DownloadedArchive, FailureKind, RemoteStatus, Upload};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Whole-request deadline for status polls.
    pub status_timeout: Duration,
    /// Longest silence tolerated mid-transfer on uploads and downloads,
    /// which otherwise run as long as data keeps flowing.
    pub read_timeout: Duration,
    pub max_download_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            status_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            max_download_bytes: 512 * 1024 * 1024,
        }
    }
}

/// HTTP contract of the processing service.
#[async_trait::async_trait]
pub trait ProcessingClient: Send + Sync {
    /// `POST /process`; returns the task id.
    async fn submit(&self, upload: &Upload, prompt: &str) -> Result<String, ClientError>;
    /// `GET /status/{task_id}`.
    async fn status(&self, task_id: &str) -> Result<RemoteStatus, ClientError>;
    /// `GET /download/{task_id}`.
    async fn download(&self, task_id: &str) -> Result<DownloadedArchive, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestProcessingClient {
    settings: ClientSettings,
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestProcessingClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be used as a base url"),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .build()
            .map_err(|err| ClientError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base_url,
            client,
        })
    }

    /// Appends path segments to the base url, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::new(FailureKind::InvalidUrl, "base url has no path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl ProcessingClient for ReqwestProcessingClient {
    async fn submit(&self, upload: &Upload, prompt: &str) -> Result<String, ClientError> {
        let io_error = |err: std::io::Error| {
            ClientError::new(FailureKind::Io, format!("{}: {err}", upload.path.display()))
        };
        let file = tokio::fs::File::open(&upload.path).await.map_err(io_error)?;
        let len = file.metadata().await.map_err(io_error)?.len();

        let body = Body::wrap_stream(ReaderStream::new(file));
        let mut part = Part::stream_with_length(body, len).file_name(upload.file_name.clone());
        if let Some(mime) = upload.mime.as_deref() {
            part = part
                .mime_str(mime)
                .map_err(|err| ClientError::new(FailureKind::Io, err.to_string()))?;
        }
        let form = Form::new()
            .part("file", part)
            .text("prompt", prompt.to_string());

        let response = self
            .client
            .post(self.endpoint(&["process"])?)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body = checked_body(response).await?;
        parse_submit(&body)
    }

    async fn status(&self, task_id: &str) -> Result<RemoteStatus, ClientError> {
        let response = self
            .client
            .get(self.endpoint(&["status", task_id])?)
            .timeout(self.settings.status_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body = checked_body(response).await?;
        parse_status(&body)
    }

    async fn download(&self, task_id: &str) -> Result<DownloadedArchive, ClientError> {
        let response = self
            .client
            .get(self.endpoint(&["download", task_id])?)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let max_bytes = self.settings.max_download_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ClientError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "archive too large",
                ));
            }
        }

        let suggested_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(content_disposition_filename);

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ClientError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "archive too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(DownloadedArchive {
            suggested_name,
            bytes,
        })
    }
}

async fn checked_body(response: reqwest::Response) -> Result<Vec<u8>, ClientError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    Ok(body.to_vec())
}

fn status_error(status: reqwest::StatusCode, body: &[u8]) -> ClientError {
    let message = error_detail(body).unwrap_or_else(|| status.to_string());
    ClientError::new(FailureKind::HttpStatus(status.as_u16()), message)
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(FailureKind::Timeout, err.to_string());
    }
    ClientError::new(FailureKind::Network, err.to_string())
}
