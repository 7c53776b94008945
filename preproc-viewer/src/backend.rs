//! Pre-processing backend API.
//!
//! [`Backend`] is the HTTP contract the viewer consumes; [`HttpBackend`]
//! implements it with reqwest.

mod http;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BackendError;
use crate::model::{CaptionList, DescribeResponse, ExtractionResult, FileList, UploadResponse};

pub use http::HttpBackend;

/// How `GET /api/files` should list stored uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileGrouping {
    /// One row per upload
    Flat,
    /// One row per content hash (latest upload wins)
    ByPdf,
}

/// Calls offered by the pre-processing backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /api/upload` with a multipart `file` field
    async fn upload(&self, filename: &str, content: Bytes) -> Result<UploadResponse, BackendError>;

    /// `POST /api/extract/{file_id}`
    async fn extract(&self, file_id: &str) -> Result<ExtractionResult, BackendError>;

    /// `POST /api/caption/{file_id}`: generate missing descriptions
    async fn describe(&self, file_id: &str) -> Result<DescribeResponse, BackendError>;

    /// `GET /api/caption/{file_id}`
    async fn captions(&self, file_id: &str) -> Result<CaptionList, BackendError>;

    /// `GET /api/files`
    async fn list_files(&self, grouping: FileGrouping) -> Result<FileList, BackendError>;

    /// `GET /api/file/{file_id}`: previously stored extraction result
    async fn load_file(&self, file_id: &str) -> Result<ExtractionResult, BackendError>;

    /// `GET /api/pdf/{file_id}`: original PDF bytes
    async fn pdf_bytes(&self, file_id: &str) -> Result<Bytes, BackendError>;

    /// Fetch a backend-relative or absolute artifact URL
    async fn download(&self, url: &str) -> Result<Bytes, BackendError>;

    /// Where the viewer reads a file's PDF from, for diagnostics
    fn pdf_url(&self, file_id: &str) -> String;
}
