//! Image description flows: describe, load and export.

use std::path::Path;

use tracing::{debug, info};

use crate::controller::Controller;
use crate::error::{ViewerError, ViewerResult};
use crate::model::DescribeResponse;

/// Outcome of a caption load; failures never propagate past this layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionLoad {
    Loaded { count: usize },
    /// No extraction is loaded, nothing to fetch captions for
    NoExtract,
    /// Non-success response or transport failure; cache left unchanged
    Failed,
    /// The active file changed while the request was in flight
    Stale,
}

impl Controller {
    /// Ask the backend to describe every image that has no description
    /// yet, then reload the caption list
    pub async fn describe(&self) -> ViewerResult<DescribeResponse> {
        let ticket = {
            let session = self.session.lock();
            session.extract().and_then(|_| session.ticket())
        };
        let Some(ticket) = ticket else {
            let message = self.msg("captions-no-extract", &[]);
            self.log.warn(message.clone());
            return Err(ViewerError::missing(message));
        };

        self.log.info(self.msg("captions-describe-starting", &[]));
        let outcome = self
            .guarded(&ticket, self.backend.describe(&ticket.file_id))
            .await
            .ok_or_else(|| ViewerError::Stale {
                file_id: ticket.file_id.clone(),
            })?;

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                self.log
                    .error(self.msg("captions-describe-failed", &[("error", &e.detail())]));
                return Err(e.into());
            }
        };

        let count = response.count.to_string();
        info!(file_id = %ticket.file_id, count = response.count, "Descriptions generated");
        self.log
            .info(self.msg("captions-describe-done", &[("count", &count)]));
        if response.count == 0 {
            self.log.info(self.msg("captions-describe-cached", &[]));
        } else {
            self.log
                .info(self.msg("captions-describe-generated", &[("count", &count)]));
        }

        self.load_captions().await;
        Ok(response)
    }

    /// Fetch the caption list of the active file and replace the cache
    pub async fn load_captions(&self) -> CaptionLoad {
        let ticket = {
            let session = self.session.lock();
            session.extract().and_then(|_| session.ticket())
        };
        let Some(ticket) = ticket else {
            debug!("No extraction loaded, skipping caption load");
            return CaptionLoad::NoExtract;
        };

        self.log.info(self.msg("captions-loading", &[]));
        let list = match self
            .guarded(&ticket, self.backend.captions(&ticket.file_id))
            .await
        {
            Some(Ok(list)) => list,
            Some(Err(e)) => {
                let status = e
                    .status()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| e.detail());
                self.log
                    .warn(self.msg("captions-load-failed", &[("status", &status)]));
                return CaptionLoad::Failed;
            }
            None => return CaptionLoad::Stale,
        };

        let count = list.items.len();
        self.log
            .info(self.msg("captions-loaded", &[("count", &count.to_string())]));
        if count == 0 {
            self.log.info(self.msg("captions-empty", &[]));
        }

        self.captions.lock().replace(&ticket.file_id, list.items);
        self.render_captions_tab();
        CaptionLoad::Loaded { count }
    }

    /// Write the filtered caption view as pretty JSON
    pub async fn export_captions(&self, path: &Path) -> ViewerResult<usize> {
        let (json, count) = {
            let cache = self.captions.lock();
            let filter = self.view.lock().filter.clone();
            let visible = cache.filter(&filter);
            let json = serde_json::to_string_pretty(&visible).map_err(|source| {
                ViewerError::Serialization {
                    what: "caption list",
                    source,
                }
            })?;
            (json, visible.len())
        };

        tokio::fs::write(path, json)
            .await
            .map_err(|source| ViewerError::Io {
                path: path.display().to_string(),
                source,
            })?;
        info!(path = %path.display(), count, "Exported captions");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::captions::tests::record;
    use crate::captions::{CaptionFilter, OcrFilter};
    use crate::controller::tests::{controller, extraction};
    use crate::model::CaptionRecord;
    use crate::render::{NO_CAPTIONS, Tab};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn stored_backend() -> FakeBackend {
        FakeBackend::new()
            .with_stored("f1", extraction("f1"))
            .with_stored("f2", extraction("f2"))
    }

    fn hashes(controller: &crate::controller::Controller) -> BTreeSet<String> {
        controller
            .captions()
            .items()
            .iter()
            .map(|r| r.image_hash.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_describe_without_extract_makes_no_request() {
        let backend = Arc::new(FakeBackend::new());
        let controller = controller(backend.clone(), 1);

        let err = controller.describe().await.unwrap_err();

        assert_eq!(err.error_code(), "missing_precondition");
        assert!(controller.log().contains("No extraction loaded."));
        assert!(backend.calls().is_empty());
        assert_eq!(controller.load_captions().await, CaptionLoad::NoExtract);
    }

    #[tokio::test]
    async fn test_second_describe_reuses_cache() {
        let backend = Arc::new(stored_backend().with_captions(
            "f1",
            vec![record("h1", "Mapa", ""), record("h2", "", "ESCALA")],
        ));
        let controller = controller(backend.clone(), 1);
        controller.select_file("f1").await.unwrap();

        let first = controller.describe().await.unwrap();
        let after_first = hashes(&controller);
        let second = controller.describe().await.unwrap();

        assert_eq!(first.count, 1);
        assert_eq!(second.count, 0);
        assert_eq!(hashes(&controller), after_first);
        assert_eq!(controller.captions().described_count(), 2);
        assert!(controller.log().contains("1 new descriptions were generated and saved"));
        assert!(
            controller
                .log()
                .contains("All images were already described (reusing cache)")
        );
        assert_eq!(backend.count_calls("POST /api/caption/f1"), 2);
    }

    #[tokio::test]
    async fn test_empty_caption_list_renders_message() {
        let backend = Arc::new(stored_backend());
        let controller = controller(backend, 1);
        controller.select_file("f1").await.unwrap();

        let view = controller.view();
        let panel = view.panel(Tab::Captions).unwrap();
        assert!(panel.as_str().contains(NO_CAPTIONS));
        assert!(!panel.as_str().contains("<table"));
        assert!(view.filters_visible);
        assert!(controller.log().contains("Loaded 0 image descriptions"));
    }

    #[tokio::test]
    async fn test_failed_load_leaves_cache_unchanged() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_upload("f1", "report.pdf")
                .with_extraction("f1", extraction("f1"))
                .with_captions("f1", vec![record("h1", "Mapa", "")])
                .failing("GET", 500, "boom"),
        );
        let controller = controller(backend, 1);
        controller
            .upload("report.pdf", bytes::Bytes::from_static(b"%PDF"))
            .await
            .unwrap();

        controller.extract().await.unwrap();

        assert!(!controller.captions().is_loaded());
        assert!(controller.captions().items().is_empty());
        assert!(controller.log().contains("Could not load descriptions: 500"));
        assert!(controller.view().panel(Tab::Captions).is_none());
    }

    #[tokio::test]
    async fn test_switching_file_discards_in_flight_caption_load() {
        let backend = Arc::new(
            stored_backend()
                .with_captions("f1", vec![record("a1", "Mapa", "")])
                .with_captions("f2", vec![record("b1", "Logo", ""), record("b2", "", "")]),
        );
        let controller = controller(backend.clone(), 1);
        controller.select_file("f1").await.unwrap();
        let release_f1 = backend.gate_captions("f1");

        let (stale, _) = tokio::join!(controller.load_captions(), async {
            controller.select_file("f2").await.unwrap();
            let _ = release_f1.send(());
        });

        assert_eq!(stale, CaptionLoad::Stale);
        assert_eq!(controller.captions().file_id(), Some("f2"));
        assert_eq!(
            hashes(&controller),
            BTreeSet::from(["b1".to_string(), "b2".to_string()])
        );
        assert!(controller.log().contains("Discarded a stale response for file_id=f1"));
    }

    #[tokio::test]
    async fn test_filters_apply_only_on_request() {
        let backend = Arc::new(stored_backend().with_captions(
            "f1",
            vec![record("h1", "Mapa", "ESCALA"), record("h2", "Logo", "")],
        ));
        let controller = controller(backend, 1);
        controller.select_file("f1").await.unwrap();
        assert!(
            controller
                .view()
                .panel(Tab::Captions)
                .unwrap()
                .as_str()
                .contains("h2")
        );

        controller.apply_filters(CaptionFilter::new("", OcrFilter::WithText));

        let panel = controller.view().panel(Tab::Captions).unwrap().clone();
        assert!(panel.as_str().contains("h1"));
        assert!(!panel.as_str().contains("h2"));
        assert_eq!(controller.captions().items().len(), 2);
    }

    #[tokio::test]
    async fn test_export_writes_filtered_view() {
        let backend = Arc::new(stored_backend().with_captions(
            "f1",
            vec![record("h1", "Mapa", "ESCALA"), record("h2", "Logo", "")],
        ));
        let controller = controller(backend, 1);
        controller.select_file("f1").await.unwrap();
        controller.apply_filters(CaptionFilter::new("mapa", OcrFilter::Any));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captions.json");

        let count = controller.export_captions(&path).await.unwrap();

        let exported: Vec<CaptionRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(count, 1);
        assert_eq!(exported[0].image_hash, "h1");
    }
}
