//! Writes the view to disk: `index.html` plus one PNG per painted page.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::controller::Controller;
use crate::error::{ViewerError, ViewerResult};
use crate::render::report::render_report;
use crate::viewer::engine::Canvas;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ViewerError + '_ {
    move |source| ViewerError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub fn canvas_file_name(canvas: &Canvas) -> String {
    format!("page-{}.png", canvas.page)
}

/// Save a painted page as `page-{n}.png` inside `dir`
pub fn save_canvas(dir: &Path, canvas: &Canvas) -> ViewerResult<PathBuf> {
    std::fs::create_dir_all(dir).map_err(io_error(dir))?;
    let path = dir.join(canvas_file_name(canvas));
    canvas
        .image
        .save(&path)
        .map_err(|source| ViewerError::Image {
            path: path.display().to_string(),
            source,
        })?;
    Ok(path)
}

/// Write the controller's current view as `index.html` inside `dir`,
/// together with the canvas currently shown by the viewer
pub fn write_report(controller: &Controller, dir: &Path, title: &str) -> ViewerResult<PathBuf> {
    std::fs::create_dir_all(dir).map_err(io_error(dir))?;

    let canvas_src = match controller.with_viewer(|viewer| viewer.canvas().cloned()) {
        Some(canvas) => {
            save_canvas(dir, &canvas)?;
            Some(canvas_file_name(&canvas))
        }
        None => None,
    };

    let page = render_report(
        title,
        &controller.view(),
        &controller.log().entries(),
        canvas_src.as_deref(),
    );
    let path = dir.join("index.html");
    std::fs::write(&path, page).map_err(io_error(&path))?;

    info!(path = %path.display(), "Report written");
    Ok(path)
}
