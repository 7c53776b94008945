//! PDF page viewer.
//!
//! Paints one page at a time through a [`RenderEngine`]. The document
//! handle opened at load time is kept for the active file and released
//! when another file is loaded or the viewer is reset.

pub mod engine;
pub mod pdfium;

use tracing::{debug, info};

use crate::error::EngineError;
use engine::{Canvas, DocumentHandle, RenderEngine};

/// Viewer lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerState {
    Unloaded,
    Loading { file_id: String },
    Ready { file_id: String, page: u32, total: u32 },
}

pub struct PdfViewer {
    zoom: f32,
    state: ViewerState,
    document: Option<Box<dyn DocumentHandle>>,
    canvas: Option<Canvas>,
    paints: u64,
}

impl PdfViewer {
    pub fn new(zoom: f32) -> Self {
        Self {
            zoom,
            state: ViewerState::Unloaded,
            document: None,
            canvas: None,
            paints: 0,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    /// File whose document is loaded or loading
    pub fn file_id(&self) -> Option<&str> {
        match &self.state {
            ViewerState::Unloaded => None,
            ViewerState::Loading { file_id } | ViewerState::Ready { file_id, .. } => {
                Some(file_id.as_str())
            }
        }
    }

    /// Current page and page count, when ready
    pub fn position(&self) -> Option<(u32, u32)> {
        match self.state {
            ViewerState::Ready { page, total, .. } => Some((page, total)),
            _ => None,
        }
    }

    /// The last painted page
    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    /// Number of paints since creation
    #[cfg(test)]
    pub fn paints(&self) -> u64 {
        self.paints
    }

    pub fn can_next(&self) -> bool {
        matches!(self.state, ViewerState::Ready { page, total, .. } if page < total)
    }

    pub fn can_previous(&self) -> bool {
        matches!(self.state, ViewerState::Ready { page, .. } if page > 1)
    }

    /// Enter `Loading` for `file_id`, releasing whatever was loaded before
    pub fn begin_load(&mut self, file_id: &str) {
        self.release();
        self.state = ViewerState::Loading {
            file_id: file_id.to_string(),
        };
    }

    /// Open `content` and paint page 1.
    ///
    /// Only applies while loading `file_id`; any failure leaves the viewer
    /// `Unloaded`. Returns the page count.
    pub fn complete_load(
        &mut self,
        file_id: &str,
        engine: &dyn RenderEngine,
        content: Vec<u8>,
    ) -> Result<u32, EngineError> {
        if !matches!(&self.state, ViewerState::Loading { file_id: loading } if loading == file_id)
        {
            return Err(EngineError::NotLoaded);
        }

        let result = self.open_and_paint_first(engine, content);
        match result {
            Ok((document, canvas, total)) => {
                self.document = Some(document);
                self.show(canvas);
                self.state = ViewerState::Ready {
                    file_id: file_id.to_string(),
                    page: 1,
                    total,
                };
                info!(file_id = %file_id, engine = %engine.name(), total, "Document loaded");
                Ok(total)
            }
            Err(e) => {
                self.release();
                Err(e)
            }
        }
    }

    fn open_and_paint_first(
        &self,
        engine: &dyn RenderEngine,
        content: Vec<u8>,
    ) -> Result<(Box<dyn DocumentHandle>, Canvas, u32), EngineError> {
        let document = engine.open(content)?;
        let total = document.page_count();
        if total == 0 {
            return Err(EngineError::Open {
                message: "document has no pages".to_string(),
            });
        }
        let canvas = document.render_page(1, self.zoom)?;
        Ok((document, canvas, total))
    }

    /// Abandon the load of `file_id`, if it is still the one in progress
    pub fn abort_load(&mut self, file_id: &str) {
        if matches!(&self.state, ViewerState::Loading { file_id: loading } if loading == file_id) {
            self.release();
        }
    }

    /// Show the following page. `Ok(false)` when already on the last page.
    pub fn next(&mut self) -> Result<bool, EngineError> {
        if !self.can_next() {
            return Ok(false);
        }
        self.step(1)
    }

    /// Show the preceding page. `Ok(false)` when already on page 1.
    pub fn previous(&mut self) -> Result<bool, EngineError> {
        if !self.can_previous() {
            return Ok(false);
        }
        self.step(-1)
    }

    /// Paint every page in order, ending on the last one
    pub fn paint_all(&mut self) -> Result<Vec<Canvas>, EngineError> {
        let (_, total) = self.position().ok_or(EngineError::NotLoaded)?;
        let mut canvases = Vec::with_capacity(total as usize);
        for page in 1..=total {
            canvases.push(self.go_to(page)?);
        }
        Ok(canvases)
    }

    fn step(&mut self, delta: i64) -> Result<bool, EngineError> {
        let (page, _) = self.position().ok_or(EngineError::NotLoaded)?;
        let target = (page as i64 + delta) as u32;
        self.go_to(target)?;
        Ok(true)
    }

    fn go_to(&mut self, target: u32) -> Result<Canvas, EngineError> {
        let document = self.document.as_ref().ok_or(EngineError::NotLoaded)?;
        let canvas = document.render_page(target, self.zoom)?;
        if let ViewerState::Ready { page, .. } = &mut self.state {
            *page = target;
        }
        self.show(canvas.clone());
        debug!(page = target, "Page painted");
        Ok(canvas)
    }

    /// Replace the canvas wholesale
    fn show(&mut self, canvas: Canvas) {
        self.canvas = Some(canvas);
        self.paints += 1;
    }

    /// Drop the document handle and the canvas
    pub fn release(&mut self) {
        if self.document.take().is_some() {
            debug!(file_id = ?self.file_id(), "Released document handle");
        }
        self.canvas = None;
        self.state = ViewerState::Unloaded;
    }
}
