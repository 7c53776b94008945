//! Orchestration layer.
//!
//! The [`Controller`] owns the session, the caption cache, the page viewer
//! and the view state, and runs every user action as
//! call backend → await → mutate → render. Locks are only held between
//! awaits, never across one.

mod captions;
mod catalog;
mod pages;
mod upload;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::captions::{CaptionCache, CaptionFilter};
use crate::config::ViewerConfig;
use crate::diagnostics::LogPanel;
use crate::i18n::I18n;
use crate::render::{self, Tab};
use crate::session::{FileChange, RequestTicket, Session};
use crate::view::{Pager, ViewState};
use crate::viewer::PdfViewer;
use crate::viewer::engine::{EngineReadiness, EngineSlot};

pub struct Controller {
    backend: Arc<dyn Backend>,
    engine: EngineSlot,
    engine_wait: Duration,
    i18n: I18n,
    locale: String,
    session: Mutex<Session>,
    captions: Mutex<CaptionCache>,
    viewer: Mutex<PdfViewer>,
    view: Mutex<ViewState>,
    log: LogPanel,
}

impl Controller {
    pub fn new(backend: Arc<dyn Backend>, engine: EngineSlot, config: &ViewerConfig) -> Self {
        let i18n = I18n::new();
        let locale = i18n.resolve_locale(&config.ui.locale);
        Self {
            backend,
            engine,
            engine_wait: config.viewer.engine_wait(),
            i18n,
            locale,
            session: Mutex::new(Session::new()),
            captions: Mutex::new(CaptionCache::new()),
            viewer: Mutex::new(PdfViewer::new(config.viewer.zoom)),
            view: Mutex::new(ViewState::new()),
            log: LogPanel::new(),
        }
    }

    pub fn log(&self) -> &LogPanel {
        &self.log
    }

    /// Snapshot of the view state
    pub fn view(&self) -> ViewState {
        self.view.lock().clone()
    }

    pub fn active_file(&self) -> Option<String> {
        self.session.lock().file_id().map(str::to_string)
    }

    pub fn captions(&self) -> CaptionCache {
        self.captions.lock().clone()
    }

    /// Run `f` with the page viewer
    pub fn with_viewer<T>(&self, f: impl FnOnce(&PdfViewer) -> T) -> T {
        f(&self.viewer.lock())
    }

    fn msg(&self, key: &str, args: &[(&str, &str)]) -> String {
        self.i18n.format(&self.locale, key, args)
    }

    /// Wait once for the rendering engine. An unavailable engine only
    /// degrades the viewer.
    pub async fn bootstrap_engine(&self) -> bool {
        self.log.info(self.msg("engine-waiting", &[]));
        match self.engine.wait(self.engine_wait).await {
            EngineReadiness::Ready(engine) => {
                info!(engine = %engine.name(), "Rendering engine ready");
                self.log.info(self.msg("engine-ready", &[]));
                true
            }
            EngineReadiness::Unavailable { reason } => {
                self.log
                    .warn(self.msg("engine-unavailable", &[("reason", &reason)]));
                false
            }
        }
    }

    /// Make `file_id` active; a switch drops every file-scoped cache
    fn activate(&self, file_id: &str) -> RequestTicket {
        let mut session = self.session.lock();
        if session.set_active_file(file_id) == FileChange::Switched {
            self.drop_file_state();
        }
        RequestTicket {
            file_id: file_id.to_string(),
            generation: session.generation(),
            cancel: session.cancel_token(),
        }
    }

    /// Make a pending switch active once its load succeeded; `false` when
    /// the ticket was superseded in the meantime
    fn commit_switch(&self, ticket: &RequestTicket) -> bool {
        let mut session = self.session.lock();
        match session.commit_switch(ticket) {
            FileChange::Switched => {
                self.drop_file_state();
                true
            }
            FileChange::Unchanged => session.is_current(ticket),
        }
    }

    /// Caller holds the session lock
    fn drop_file_state(&self) {
        self.captions.lock().invalidate();
        self.viewer.lock().release();
        let mut view = self.view.lock();
        view.clear_panels();
        view.download_url = None;
        view.describe_enabled = false;
        view.pager = Pager::default();
    }

    fn ticket(&self) -> Option<RequestTicket> {
        self.session.lock().ticket()
    }

    /// Await `request` unless the ticket's file stops being active first.
    ///
    /// `None` means the response is stale and was discarded.
    async fn guarded<T>(
        &self,
        ticket: &RequestTicket,
        request: impl Future<Output = T>,
    ) -> Option<T> {
        let output = tokio::select! {
            _ = ticket.cancel.cancelled() => None,
            output = request => Some(output),
        };

        match output {
            Some(output) if self.session.lock().is_current(ticket) => Some(output),
            _ => {
                debug!(file_id = %ticket.file_id, generation = ticket.generation, "Stale response discarded");
                self.log
                    .warn(self.msg("request-stale", &[("file_id", &ticket.file_id)]));
                None
            }
        }
    }

    /// Re-render the extraction tabs from the session's extraction result
    fn render_extract_tabs(&self) {
        let session = self.session.lock();
        let Some(extract) = session.extract() else {
            return;
        };
        let mut view = self.view.lock();
        view.set_panel(Tab::Text, render::render_text_tab(extract));
        view.set_panel(Tab::Images, render::render_images_tab(extract));
        view.set_panel(Tab::Tables, render::render_tables_tab(extract));
        view.set_panel(Tab::Metadata, render::render_metadata_tab(extract));
    }

    fn render_captions_tab(&self) {
        let cache = self.captions.lock();
        let mut view = self.view.lock();
        let html = render::render_captions_tab(&cache, &view.filter);
        view.set_panel(Tab::Captions, html);
    }

    fn refresh_pager(&self) {
        let (pager, position) = {
            let viewer = self.viewer.lock();
            (Pager::from_viewer(&viewer), viewer.position())
        };
        if let Some((page, total)) = position {
            self.session.lock().set_pages(page, total);
        }
        self.view.lock().pager = pager;
    }

    pub fn select_tab(&self, tab: Tab) {
        self.view.lock().select_tab(tab);
    }

    /// Read new filter control values and re-render the captions panel
    pub fn apply_filters(&self, filter: CaptionFilter) {
        self.view.lock().filter = filter;
        self.render_captions_tab();
    }
}
