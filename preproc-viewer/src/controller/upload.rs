//! Upload, extraction and artifact download.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info};

use crate::catalog::compute_content_hash;
use crate::controller::Controller;
use crate::error::{ViewerError, ViewerResult};
use crate::model::{ExtractionResult, UploadResponse};

/// Local file name for a downloaded artifact URL
fn artifact_file_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "artifacts.zip".to_string(),
    }
}

impl Controller {
    /// Upload a PDF and make it the active file.
    ///
    /// Enables extraction and tries to load the document into the viewer;
    /// a viewer failure does not fail the upload.
    pub async fn upload(&self, filename: &str, content: Bytes) -> ViewerResult<UploadResponse> {
        if content.is_empty() {
            let message = self.msg("upload-no-file", &[]);
            self.log.alert(message.clone());
            return Err(ViewerError::missing(message));
        }

        self.view.lock().download_url = None;

        let pdf_hash = compute_content_hash(&content);
        debug!(filename = %filename, pdf_hash = %pdf_hash, size = content.len(), "Uploading PDF");
        let known = self.view.lock().catalog.find_by_hash(&pdf_hash).cloned();
        if let Some(entry) = known {
            self.log.info(self.msg(
                "upload-known-content",
                &[("filename", &entry.label), ("file_id", &entry.file_id)],
            ));
        }

        self.log.info(self.msg("upload-sending", &[]));
        let response = match self.backend.upload(filename, content).await {
            Ok(response) => response,
            Err(e) => {
                self.log
                    .error(self.msg("upload-failed", &[("error", &e.detail())]));
                self.log.alert(self.msg("upload-failed-alert", &[]));
                return Err(e.into());
            }
        };

        self.activate(&response.file_id);
        info!(file_id = %response.file_id, filename = %response.filename, "Upload complete");
        self.log.info(self.msg(
            "upload-ok",
            &[("file_id", &response.file_id), ("filename", &response.filename)],
        ));
        self.view.lock().extract_enabled = true;

        self.load_viewer().await;

        Ok(response)
    }

    /// Run server-side extraction for the active file and render every tab
    pub async fn extract(&self) -> ViewerResult<ExtractionResult> {
        let Some(ticket) = self.ticket() else {
            let message = self.msg("extract-no-file", &[]);
            self.log.warn(message.clone());
            return Err(ViewerError::missing(message));
        };

        self.log.info(self.msg("extract-starting", &[]));
        let outcome = self
            .guarded(&ticket, self.backend.extract(&ticket.file_id))
            .await
            .ok_or_else(|| ViewerError::Stale {
                file_id: ticket.file_id.clone(),
            })?;

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                self.log
                    .alert(self.msg("extract-failed", &[("error", &e.detail())]));
                return Err(e.into());
            }
        };

        if let Some(result_file_id) = result.file_id()
            && result_file_id != ticket.file_id
        {
            self.log.error(self.msg(
                "extract-file-mismatch",
                &[("result_file_id", result_file_id), ("file_id", &ticket.file_id)],
            ));
            return Err(ViewerError::FileMismatch {
                expected: ticket.file_id.clone(),
                actual: result_file_id.to_string(),
            });
        }

        self.log.info(self.msg(
            "extract-done",
            &[
                ("pages", &result.pages.len().to_string()),
                ("tables", &result.tables.len().to_string()),
            ],
        ));
        info!(
            file_id = %ticket.file_id,
            pages = result.pages.len(),
            tables = result.tables.len(),
            images = result.image_count(),
            "Extraction complete"
        );

        self.show_extract(result.clone());
        self.load_captions().await;

        Ok(result)
    }

    /// Store a fresh extraction result and update every control that depends on it
    pub(crate) fn show_extract(&self, result: ExtractionResult) {
        let zip_url = result.zip_url().map(str::to_string);
        self.session.lock().set_extract(result);
        self.render_extract_tabs();

        {
            let mut view = self.view.lock();
            view.extract_enabled = true;
            view.describe_enabled = true;
            view.download_url = zip_url.clone();
        }

        if let Some(url) = zip_url {
            self.log
                .info(self.msg("extract-download-ready", &[("url", &url)]));
        }
    }

    /// Fetch the packaged artifacts of the current extraction into `dir`
    pub async fn download_artifacts(&self, dir: &Path) -> ViewerResult<PathBuf> {
        let url = self
            .view
            .lock()
            .download_url
            .clone()
            .ok_or_else(|| ViewerError::missing("no artifact package for the current file"))?;
        let ticket = self
            .ticket()
            .ok_or_else(|| ViewerError::missing("no active file"))?;

        let content = match self
            .guarded(&ticket, self.backend.download(&url))
            .await
            .ok_or_else(|| ViewerError::Stale {
                file_id: ticket.file_id.clone(),
            })? {
            Ok(content) => content,
            Err(e) => {
                self.log
                    .error(self.msg("download-failed", &[("error", &e.detail())]));
                return Err(e.into());
            }
        };

        let path = dir.join(artifact_file_name(&url));
        tokio::fs::write(&path, &content)
            .await
            .map_err(|source| ViewerError::Io {
                path: path.display().to_string(),
                source,
            })?;

        info!(path = %path.display(), bytes = content.len(), "Artifacts saved");
        self.log.info(self.msg(
            "download-saved",
            &[("path", &path.display().to_string())],
        ));
        Ok(path)
    }
}
