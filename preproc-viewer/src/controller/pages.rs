//! Page viewer wiring.

use tracing::{debug, info, warn};

use crate::controller::Controller;
use crate::error::{EngineError, ViewerResult};
use crate::viewer::engine::{Canvas, EngineReadiness};

impl Controller {
    /// Load the active file's PDF into the viewer and paint page 1.
    ///
    /// Never fails the calling action: problems are logged and the viewer
    /// stays unloaded.
    pub async fn load_viewer(&self) -> bool {
        let Some(ticket) = self.ticket() else {
            return false;
        };
        let file_id = ticket.file_id.as_str();

        let url = self.backend.pdf_url(file_id);
        self.log.info(self.msg("viewer-loading", &[("url", &url)]));
        self.viewer.lock().begin_load(file_id);

        let engine = match self.engine.wait(self.engine_wait).await {
            EngineReadiness::Ready(engine) => engine,
            EngineReadiness::Unavailable { reason } => {
                self.viewer_load_failed(file_id, &EngineError::Unavailable { reason }.to_string());
                return false;
            }
        };

        let content = match self.guarded(&ticket, self.backend.pdf_bytes(file_id)).await {
            Some(Ok(content)) => content,
            Some(Err(e)) => {
                self.viewer_load_failed(file_id, &e.detail());
                return false;
            }
            None => return false,
        };

        let loaded = self
            .viewer
            .lock()
            .complete_load(file_id, engine.as_ref(), content.to_vec());
        match loaded {
            Ok(total) => {
                self.refresh_pager();
                self.log
                    .info(self.msg("viewer-rendered", &[("pages", &total.to_string())]));
                true
            }
            Err(e) => {
                self.viewer_load_failed(file_id, &e.to_string());
                false
            }
        }
    }

    fn viewer_load_failed(&self, file_id: &str, error: &str) {
        warn!(file_id = %file_id, error = %error, "Viewer load failed");
        self.viewer.lock().abort_load(file_id);
        self.refresh_pager();
        self.log
            .warn(self.msg("viewer-load-failed", &[("error", error)]));
    }

    /// Paint the next page; `false` when already on the last one
    pub fn next_page(&self) -> ViewerResult<bool> {
        let turned = self.viewer.lock().next();
        self.after_turn(turned)
    }

    /// Paint the previous page; `false` when already on page 1
    pub fn previous_page(&self) -> ViewerResult<bool> {
        let turned = self.viewer.lock().previous();
        self.after_turn(turned)
    }

    fn after_turn(&self, turned: Result<bool, EngineError>) -> ViewerResult<bool> {
        match turned {
            Ok(painted) => {
                self.refresh_pager();
                Ok(painted)
            }
            Err(e) => {
                let page = e.page().map(|p| p.to_string()).unwrap_or_default();
                self.log.warn(self.msg(
                    "viewer-page-failed",
                    &[("page", &page), ("error", &e.to_string())],
                ));
                Err(e.into())
            }
        }
    }

    /// Step one page at a time to `target`; returns the page shown afterwards
    pub fn go_to_page(&self, target: u32) -> ViewerResult<u32> {
        let (mut current, total) = {
            let session = self.session.lock();
            (session.current_page(), session.total_pages())
        };
        if total == 0 {
            return Err(EngineError::NotLoaded.into());
        }
        if target == 0 || target > total {
            return Err(EngineError::PageOutOfRange {
                page: target,
                total,
            }
            .into());
        }

        while current < target && self.next_page()? {
            current += 1;
        }
        while current > target && self.previous_page()? {
            current -= 1;
        }

        debug!(page = current, total, "Viewer positioned");
        Ok(current)
    }

    /// Paint every page of the loaded document in order
    pub fn paint_all_pages(&self) -> ViewerResult<Vec<Canvas>> {
        let painted = self.viewer.lock().paint_all();
        match painted {
            Ok(canvases) => {
                self.refresh_pager();
                info!(pages = canvases.len(), "Painted every page");
                Ok(canvases)
            }
            Err(e) => {
                self.refresh_pager();
                Err(e.into())
            }
        }
    }
}
