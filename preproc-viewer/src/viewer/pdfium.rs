//! PDFium-backed rendering engine (dynamically linked).

use std::path::PathBuf;
use std::sync::OnceLock;

use pdfium_render::prelude::*;
use tracing::{debug, info};

use super::engine::{Canvas, DocumentHandle, RenderEngine};
use crate::error::EngineError;

/// The process-wide library binding; documents borrow from it
static PDFIUM: OnceLock<Pdfium> = OnceLock::new();

/// Rendering engine over the process-wide PDFium binding
pub struct PdfiumEngine {
    pdfium: &'static Pdfium,
}

impl PdfiumEngine {
    /// Bind libpdfium, trying each directory in `search_paths` and then the
    /// system library paths. Binding happens once per process; later calls
    /// reuse it.
    pub fn bind(search_paths: &[PathBuf]) -> Result<Self, EngineError> {
        if let Some(pdfium) = PDFIUM.get() {
            return Ok(Self { pdfium });
        }

        let mut last_error = None;
        let mut bindings = None;
        for path in search_paths {
            match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path)) {
                Ok(found) => {
                    info!(path = %path.display(), "Bound libpdfium");
                    bindings = Some(found);
                    break;
                }
                Err(e) => {
                    debug!(path = %path.display(), error = ?e, "libpdfium not found at path");
                    last_error = Some(e);
                }
            }
        }

        let bindings = match bindings {
            Some(bindings) => bindings,
            None => Pdfium::bind_to_system_library().map_err(|e| EngineError::Unavailable {
                reason: format!(
                    "Failed to load PDFium library (searched {:?} and system paths): {:?}",
                    search_paths,
                    last_error.unwrap_or(e)
                ),
            })?,
        };

        let _ = PDFIUM.set(Pdfium::new(bindings));
        let pdfium = PDFIUM.get().ok_or_else(|| EngineError::Unavailable {
            reason: "PDFium binding was not retained".to_string(),
        })?;
        Ok(Self { pdfium })
    }
}

impl RenderEngine for PdfiumEngine {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn open(&self, content: Vec<u8>) -> Result<Box<dyn DocumentHandle>, EngineError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_vec(content, None)
            .map_err(|e| EngineError::Open {
                message: e.to_string(),
            })?;
        debug!(pages = document.pages().len(), "Opened PDF document");
        Ok(Box::new(PdfiumDocument { document }))
    }
}

struct PdfiumDocument {
    document: PdfDocument<'static>,
}

impl DocumentHandle for PdfiumDocument {
    fn page_count(&self) -> u32 {
        self.document.pages().len() as u32
    }

    fn render_page(&self, page: u32, zoom: f32) -> Result<Canvas, EngineError> {
        let total = self.page_count();
        if page == 0 || page > total {
            return Err(EngineError::PageOutOfRange { page, total });
        }

        let pdf_page = self
            .document
            .pages()
            .get((page - 1) as u16)
            .map_err(|e| EngineError::Render {
                page,
                message: e.to_string(),
            })?;

        // Viewport in points, scaled by the zoom factor
        let width = (pdf_page.width().value * zoom).ceil() as i32;
        let height = (pdf_page.height().value * zoom).ceil() as i32;

        let config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height);

        let bitmap = pdf_page
            .render_with_config(&config)
            .map_err(|e| EngineError::Render {
                page,
                message: e.to_string(),
            })?;

        debug!(page, width, height, zoom, "Rendered page");

        Ok(Canvas {
            page,
            image: bitmap.as_image().to_rgba8(),
        })
    }
}
