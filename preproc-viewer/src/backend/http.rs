//! reqwest implementation of the backend contract.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{Backend, FileGrouping};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::model::{CaptionList, DescribeResponse, ExtractionResult, FileList, UploadResponse};

/// Pre-processing backend client
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new backend client
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(BackendError::Client)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Resolve a URL embedded in a payload against the backend base URL
    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            self.url(url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }

    fn file_path(prefix: &str, file_id: &str) -> String {
        format!("{}/{}", prefix, urlencoding::encode(file_id))
    }

    /// Send a request, turning transport failures and non-success statuses into errors
    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, BackendError> {
        debug!(url = %url, "Backend request");

        let response = request.send().await.map_err(|e| BackendError::Connection {
            url: url.to_string(),
            source: e,
        })?;

        if !response.status().is_success() {
            return Err(BackendError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response)
    }

    async fn json<T: DeserializeOwned>(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        self.send(url, request)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse {
                url: url.to_string(),
                source: e,
            })
    }

    async fn bytes(&self, url: &str) -> Result<Bytes, BackendError> {
        self.send(url, self.client.get(url))
            .await?
            .bytes()
            .await
            .map_err(|e| BackendError::Connection {
                url: url.to_string(),
                source: e,
            })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn upload(&self, filename: &str, content: Bytes) -> Result<UploadResponse, BackendError> {
        let url = self.url("/api/upload");
        let part = Part::bytes(content.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(BackendError::Client)?;
        let form = Form::new().part("file", part);

        self.json(&url, self.client.post(&url).multipart(form)).await
    }

    async fn extract(&self, file_id: &str) -> Result<ExtractionResult, BackendError> {
        let url = self.url(&Self::file_path("/api/extract", file_id));
        self.json(&url, self.client.post(&url)).await
    }

    async fn describe(&self, file_id: &str) -> Result<DescribeResponse, BackendError> {
        let url = self.url(&Self::file_path("/api/caption", file_id));
        self.json(&url, self.client.post(&url)).await
    }

    async fn captions(&self, file_id: &str) -> Result<CaptionList, BackendError> {
        let url = self.url(&Self::file_path("/api/caption", file_id));
        self.json(&url, self.client.get(&url)).await
    }

    async fn list_files(&self, grouping: FileGrouping) -> Result<FileList, BackendError> {
        let url = match grouping {
            FileGrouping::Flat => self.url("/api/files"),
            FileGrouping::ByPdf => self.url("/api/files?group_by=pdf"),
        };
        self.json(&url, self.client.get(&url)).await
    }

    async fn load_file(&self, file_id: &str) -> Result<ExtractionResult, BackendError> {
        let url = self.url(&Self::file_path("/api/file", file_id));
        self.json(&url, self.client.get(&url)).await
    }

    async fn pdf_bytes(&self, file_id: &str) -> Result<Bytes, BackendError> {
        self.bytes(&self.pdf_url(file_id)).await
    }

    async fn download(&self, url: &str) -> Result<Bytes, BackendError> {
        self.bytes(&self.resolve(url)).await
    }

    fn pdf_url(&self, file_id: &str) -> String {
        self.url(&Self::file_path("/api/pdf", file_id))
    }
}
