//! Scripted in-memory backend for tests.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;

use super::{Backend, FileGrouping};
use crate::error::BackendError;
use crate::model::{
    CaptionList, CaptionRecord, DescribeResponse, ExtractionResult, FileList, FileSummary,
    UploadResponse,
};

#[derive(Default)]
struct FakeState {
    next_upload: Option<UploadResponse>,
    extractions: HashMap<String, ExtractionResult>,
    stored: HashMap<String, ExtractionResult>,
    captions: HashMap<String, Vec<CaptionRecord>>,
    files: Vec<FileSummary>,
    pdfs: HashMap<String, Bytes>,
    artifacts: HashMap<String, Bytes>,
    failures: HashMap<&'static str, (u16, String)>,
    caption_gates: HashMap<String, oneshot::Receiver<()>>,
    load_gates: HashMap<String, oneshot::Receiver<()>>,
    calls: Vec<String>,
}

/// Backend double whose answers are set up by the test
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upload(self, file_id: &str, filename: &str) -> Self {
        self.state.lock().next_upload = Some(UploadResponse {
            file_id: file_id.to_string(),
            filename: filename.to_string(),
        });
        self
    }

    pub fn with_extraction(self, file_id: &str, result: ExtractionResult) -> Self {
        self.state
            .lock()
            .extractions
            .insert(file_id.to_string(), result);
        self
    }

    pub fn with_stored(self, file_id: &str, result: ExtractionResult) -> Self {
        self.state.lock().stored.insert(file_id.to_string(), result);
        self
    }

    pub fn with_captions(self, file_id: &str, captions: Vec<CaptionRecord>) -> Self {
        self.state
            .lock()
            .captions
            .insert(file_id.to_string(), captions);
        self
    }

    pub fn with_files(self, files: Vec<FileSummary>) -> Self {
        self.state.lock().files = files;
        self
    }

    pub fn with_pdf(self, file_id: &str, content: &[u8]) -> Self {
        self.state
            .lock()
            .pdfs
            .insert(file_id.to_string(), Bytes::copy_from_slice(content));
        self
    }

    pub fn with_artifact(self, url: &str, content: &[u8]) -> Self {
        self.state
            .lock()
            .artifacts
            .insert(url.to_string(), Bytes::copy_from_slice(content));
        self
    }

    /// Make every call of `call` answer with a non-success status
    pub fn failing(self, call: &'static str, status: u16, body: &str) -> Self {
        self.state
            .lock()
            .failures
            .insert(call, (status, body.to_string()));
        self
    }

    /// Hold `GET /api/caption/{file_id}` until the returned sender fires
    pub fn gate_captions(&self, file_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state
            .lock()
            .caption_gates
            .insert(file_id.to_string(), rx);
        tx
    }

    /// Hold `GET /api/file/{file_id}` until the returned sender fires
    pub fn gate_load(&self, file_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().load_gates.insert(file_id.to_string(), rx);
        tx
    }

    /// Calls made so far, e.g. `"GET /api/caption/f1"`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: &'static str, path: String) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        state.calls.push(format!("{} {}", call, path));
        match state.failures.get(call) {
            Some((status, body)) => Err(BackendError::Status {
                url: path,
                status: *status,
                message: body.clone(),
            }),
            None => Ok(()),
        }
    }

    fn not_found(url: String) -> BackendError {
        BackendError::Status {
            url,
            status: 404,
            message: "Arquivo não encontrado".to_string(),
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn upload(&self, filename: &str, _content: Bytes) -> Result<UploadResponse, BackendError> {
        self.record("POST", "/api/upload".to_string())?;
        let mut response = self
            .state
            .lock()
            .next_upload
            .clone()
            .ok_or_else(|| Self::not_found("/api/upload".to_string()))?;
        if response.filename.is_empty() {
            response.filename = filename.to_string();
        }
        Ok(response)
    }

    async fn extract(&self, file_id: &str) -> Result<ExtractionResult, BackendError> {
        let path = format!("/api/extract/{}", file_id);
        self.record("POST", path.clone())?;
        self.state
            .lock()
            .extractions
            .get(file_id)
            .cloned()
            .ok_or_else(|| Self::not_found(path))
    }

    async fn describe(&self, file_id: &str) -> Result<DescribeResponse, BackendError> {
        let path = format!("/api/caption/{}", file_id);
        self.record("POST", path)?;
        let mut state = self.state.lock();
        let mut generated = Vec::new();
        for record in state.captions.entry(file_id.to_string()).or_default() {
            if record.description.is_empty() {
                record.description = format!("generated description for {}", record.image_hash);
                generated.push(serde_json::json!({
                    "hash": record.image_hash,
                    "description": record.description,
                }));
            }
        }
        Ok(DescribeResponse {
            count: generated.len(),
            items: generated,
        })
    }

    async fn captions(&self, file_id: &str) -> Result<CaptionList, BackendError> {
        let path = format!("/api/caption/{}", file_id);
        self.record("GET", path)?;
        let gate = self.state.lock().caption_gates.remove(file_id);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let items = self
            .state
            .lock()
            .captions
            .get(file_id)
            .cloned()
            .unwrap_or_default();
        Ok(CaptionList { items })
    }

    async fn list_files(&self, grouping: FileGrouping) -> Result<FileList, BackendError> {
        let path = match grouping {
            FileGrouping::Flat => "/api/files",
            FileGrouping::ByPdf => "/api/files?group_by=pdf",
        };
        self.record("GET", path.to_string())?;
        Ok(FileList {
            items: self.state.lock().files.clone(),
        })
    }

    async fn load_file(&self, file_id: &str) -> Result<ExtractionResult, BackendError> {
        let path = format!("/api/file/{}", file_id);
        self.record("GET", path.clone())?;
        let gate = self.state.lock().load_gates.remove(file_id);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.state
            .lock()
            .stored
            .get(file_id)
            .cloned()
            .ok_or_else(|| Self::not_found(path))
    }

    async fn pdf_bytes(&self, file_id: &str) -> Result<Bytes, BackendError> {
        let path = self.pdf_url(file_id);
        self.record("PDF", path.clone())?;
        self.state
            .lock()
            .pdfs
            .get(file_id)
            .cloned()
            .ok_or_else(|| Self::not_found(path))
    }

    async fn download(&self, url: &str) -> Result<Bytes, BackendError> {
        self.record("DOWNLOAD", url.to_string())?;
        self.state
            .lock()
            .artifacts
            .get(url)
            .cloned()
            .ok_or_else(|| Self::not_found(url.to_string()))
    }

    fn pdf_url(&self, file_id: &str) -> String {
        format!("/api/pdf/{}", file_id)
    }
}
