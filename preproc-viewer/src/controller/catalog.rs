//! Stored-file listing and selection.

use tracing::info;

use crate::backend::FileGrouping;
use crate::catalog::Catalog;
use crate::controller::Controller;
use crate::error::{ViewerError, ViewerResult};
use crate::model::ExtractionResult;

impl Controller {
    /// List stored files into the catalog
    pub async fn list_files(&self, grouping: FileGrouping) -> ViewerResult<Catalog> {
        let list = match self.backend.list_files(grouping).await {
            Ok(list) => list,
            Err(e) => {
                self.log
                    .error(self.msg("catalog-failed", &[("error", &e.detail())]));
                return Err(e.into());
            }
        };

        let catalog = Catalog::from_listing(&list, grouping);
        info!(
            listed = list.items.len(),
            entries = catalog.entries().len(),
            ?grouping,
            "Catalog loaded"
        );
        self.log.info(self.msg(
            "catalog-loaded",
            &[("count", &catalog.entries().len().to_string())],
        ));
        self.view.lock().catalog = catalog.clone();
        Ok(catalog)
    }

    /// Load a stored extraction result and make its file active.
    ///
    /// The active file only changes once the load succeeded; a failed load
    /// leaves the previous file untouched. The viewer load and the caption
    /// refresh that follow are best-effort.
    pub async fn select_file(&self, file_id: &str) -> ViewerResult<ExtractionResult> {
        if file_id.trim().is_empty() {
            let message = self.msg("catalog-no-selection", &[]);
            self.log.warn(message.clone());
            return Err(ViewerError::missing(message));
        }

        self.log
            .info(self.msg("catalog-loading", &[("file_id", file_id)]));
        let ticket = self.session.lock().begin_switch(file_id);

        let outcome = self
            .guarded(&ticket, self.backend.load_file(file_id))
            .await
            .ok_or_else(|| ViewerError::Stale {
                file_id: file_id.to_string(),
            })?;

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                self.session.lock().abandon_switch(&ticket);
                self.log
                    .error(self.msg("catalog-load-failed", &[("error", &e.detail())]));
                return Err(e.into());
            }
        };

        if !self.commit_switch(&ticket) {
            return Err(ViewerError::Stale {
                file_id: file_id.to_string(),
            });
        }
        info!(
            file_id = %file_id,
            pages = result.pages.len(),
            tables = result.tables.len(),
            "Loaded stored extraction"
        );
        self.show_extract(result.clone());
        self.load_viewer().await;
        self.load_captions().await;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::FileGrouping;
    use crate::backend::fake::FakeBackend;
    use crate::controller::captions::CaptionLoad;
    use crate::controller::tests::{PDF, controller, extraction};
    use crate::model::{ExtractionResult, FileSummary};
    use crate::render::Tab;
    use crate::viewer::ViewerState;
    use bytes::Bytes;
    use serde_json::json;
    use std::sync::Arc;

    fn summary(file_id: &str, hash: &str) -> FileSummary {
        FileSummary {
            file_id: file_id.to_string(),
            pdf_hash: Some(hash.to_string()),
            original_filename: "report.pdf".to_string(),
            images: 3,
            images_described: 1,
            tables: 2,
        }
    }

    #[tokio::test]
    async fn test_grouped_listing_collapses_identical_pdfs() {
        let backend = Arc::new(FakeBackend::new().with_files(vec![
            summary("f2", "aa"),
            summary("f1", "aa"),
            summary("f3", "bb"),
        ]));
        let controller = controller(backend.clone(), 1);

        let catalog = controller.list_files(FileGrouping::ByPdf).await.unwrap();

        assert_eq!(catalog.entries().len(), 2);
        assert_eq!(catalog.entries()[0].file_id, "f2");
        assert_eq!(
            catalog.entries()[0].label,
            "report.pdf (imgs:3 descr:1 tabs:2)"
        );
        assert_eq!(controller.view().catalog.entries().len(), 2);
        assert_eq!(backend.calls(), vec!["GET /api/files?group_by=pdf".to_string()]);
        assert!(controller.log().contains("Listed 2 stored file(s)"));
    }

    #[tokio::test]
    async fn test_listing_failure_is_logged() {
        let backend = Arc::new(FakeBackend::new().failing("GET", 503, "indisponível"));
        let controller = controller(backend, 1);

        let err = controller.list_files(FileGrouping::Flat).await.unwrap_err();

        assert_eq!(err.error_code(), "backend_status");
        assert!(
            controller
                .log()
                .contains("Failed to list stored files: indisponível")
        );
        assert!(controller.view().catalog.is_empty());
    }

    #[tokio::test]
    async fn test_select_without_selection_short_circuits() {
        let backend = Arc::new(FakeBackend::new());
        let controller = controller(backend.clone(), 1);

        let err = controller.select_file("").await.unwrap_err();

        assert_eq!(err.error_code(), "missing_precondition");
        assert!(controller.log().contains("Select a file"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_select_loads_extract_viewer_and_captions() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_stored("f1", extraction("f1"))
                .with_pdf("f1", PDF),
        );
        let controller = controller(backend.clone(), 4);

        controller.select_file("f1").await.unwrap();

        let view = controller.view();
        assert!(view.extract_enabled);
        assert!(view.describe_enabled);
        assert!(view.panel(Tab::Metadata).unwrap().as_str().contains("Report"));
        assert_eq!(view.pager.label.as_deref(), Some("Page 1/4"));
        assert_eq!(
            backend.calls(),
            vec![
                "GET /api/file/f1".to_string(),
                "PDF /api/pdf/f1".to_string(),
                "GET /api/caption/f1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_viewer_failure_does_not_fail_selection() {
        let backend = Arc::new(FakeBackend::new().with_stored("f1", extraction("f1")));
        let controller = controller(backend.clone(), 4);

        let result = controller.select_file("f1").await;

        assert!(result.is_ok());
        assert_eq!(
            controller.with_viewer(|v| v.state().clone()),
            ViewerState::Unloaded
        );
        assert_eq!(backend.count_calls("GET /api/caption/f1"), 1);
        assert!(controller.captions().is_loaded());
    }

    #[tokio::test]
    async fn test_synthesised_db_result_renders() {
        let synthesised: ExtractionResult = serde_json::from_value(json!({
            "upload": {"file_id": "f1"},
            "pages": [{"page": 1, "images": [{"url": "/public/images/h1.png", "hash": "h1"}]}],
            "tables": [{"hash": "t1", "url": "/public/tables/t1.json"}],
            "metadata": {},
            "download": {"zip_url": null}
        }))
        .unwrap();
        let backend = Arc::new(FakeBackend::new().with_stored("f1", synthesised));
        let controller = controller(backend, 1);

        controller.select_file("f1").await.unwrap();

        let view = controller.view();
        assert!(view.download_url.is_none());
        assert!(view.panel(Tab::Images).unwrap().as_str().contains("h1.png"));
        assert_eq!(
            view.panel(Tab::Metadata).unwrap().as_str(),
            "<pre class=\"code\">{}</pre>"
        );
    }

    #[tokio::test]
    async fn test_load_failure_is_logged() {
        let backend = Arc::new(FakeBackend::new());
        let controller = controller(backend, 1);

        let err = controller.select_file("f9").await.unwrap_err();

        assert_eq!(err.error_code(), "backend_status");
        assert!(
            controller
                .log()
                .contains("Failed to load: Arquivo não encontrado")
        );
        assert!(controller.log().alerts().is_empty());
        assert_eq!(controller.load_captions().await, CaptionLoad::NoExtract);
    }

    #[tokio::test]
    async fn test_failed_select_keeps_previous_file() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_stored("f1", extraction("f1"))
                .with_pdf("f1", PDF),
        );
        let controller = controller(backend, 3);
        controller.select_file("f1").await.unwrap();

        let err = controller.select_file("f9").await.unwrap_err();

        assert_eq!(err.error_code(), "backend_status");
        assert_eq!(controller.active_file().as_deref(), Some("f1"));
        let view = controller.view();
        assert!(view.describe_enabled);
        assert_eq!(view.download_url.as_deref(), Some("/public/zips/f1.zip"));
        assert!(view.panel(Tab::Text).unwrap().as_str().contains("Intro"));
        assert_eq!(view.pager.label.as_deref(), Some("Page 1/3"));
        assert!(matches!(
            controller.with_viewer(|v| v.state().clone()),
            ViewerState::Ready { ref file_id, .. } if file_id == "f1"
        ));
        assert!(controller.describe().await.is_ok());
    }

    #[tokio::test]
    async fn test_superseded_select_is_stale() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_stored("f1", extraction("f1"))
                .with_stored("f2", extraction("f2")),
        );
        let controller = controller(backend.clone(), 1);
        let release_f1 = backend.gate_load("f1");

        let (first, second) = tokio::join!(controller.select_file("f1"), async {
            let second = controller.select_file("f2").await;
            let _ = release_f1.send(());
            second
        });

        assert_eq!(first.unwrap_err().error_code(), "stale_response");
        assert!(second.is_ok());
        assert_eq!(controller.active_file().as_deref(), Some("f2"));
    }

    #[tokio::test]
    async fn test_upload_reports_known_content() {
        let hash = crate::catalog::compute_content_hash(PDF);
        let backend = Arc::new(
            FakeBackend::new()
                .with_files(vec![summary("f1", &hash)])
                .with_upload("f2", "report.pdf"),
        );
        let controller = controller(backend, 1);
        controller.list_files(FileGrouping::ByPdf).await.unwrap();

        controller
            .upload("report.pdf", Bytes::from_static(PDF))
            .await
            .unwrap();

        assert!(controller.log().contains("This PDF is already stored as"));
        assert!(controller.log().contains("(file_id=f1)"));
    }
}
