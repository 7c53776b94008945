use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use bytes::Bytes;
use clap::{Parser, Subcommand};
use tracing::{error, info};

mod backend;
mod captions;
mod catalog;
mod config;
mod controller;
mod diagnostics;
mod error;
mod html;
mod i18n;
mod model;
mod output;
mod render;
mod session;
mod view;
mod viewer;

use crate::backend::{FileGrouping, HttpBackend};
use crate::captions::{CaptionFilter, OcrFilter};
use crate::config::load_config;
use crate::controller::Controller;
use crate::error::{ViewerError, ViewerResult};
use crate::render::Tab;
use crate::viewer::engine::EngineSlot;
use crate::viewer::pdfium::PdfiumEngine;

#[derive(Parser, Debug)]
#[command(name = "preproc-viewer", version)]
#[command(about = "Upload PDFs to the pre-processing service and inspect what it extracted")]
struct Cli {
    /// Backend base URL (overrides `backend.base_url`)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Locale for log messages (`en`, `pt-BR`)
    #[arg(long, global = true)]
    locale: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a PDF, optionally extracting and describing it
    Upload {
        pdf: PathBuf,
        #[arg(long)]
        extract: bool,
        /// Generate image descriptions (implies --extract)
        #[arg(long)]
        describe: bool,
        /// Save the artifact package (implies --extract)
        #[arg(long)]
        download: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List stored files
    Files {
        /// One row per upload instead of one per distinct PDF
        #[arg(long)]
        flat: bool,
    },
    /// Load a stored extraction
    Open {
        file_id: String,
        #[arg(long)]
        describe: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show the image descriptions of a stored file
    Captions {
        file_id: String,
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long, default_value = "any")]
        ocr: OcrFilter,
        /// Export the filtered list as JSON instead of printing it
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Paint every page of a stored file, or step to a single page
    Pages {
        file_id: String,
        /// Page to step to instead of painting them all
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    info!("Starting preproc-viewer v{}", env!("CARGO_PKG_VERSION"));

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = e.error_code(), error = %e, "Command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ViewerResult<()> {
    let mut config = load_config()?;
    if let Some(base_url) = cli.base_url {
        config.backend.base_url = base_url;
    }
    if let Some(locale) = cli.locale {
        config.ui.locale = locale;
    }
    info!(
        base_url = %config.backend.base_url,
        locale = %config.ui.locale,
        "Configuration loaded"
    );

    let backend = Arc::new(HttpBackend::new(&config.backend)?);

    // The library binding is blocking; the viewer waits on the slot
    let (engine, provider) = EngineSlot::new();
    let library_paths = config.viewer.pdfium_library_paths.clone();
    tokio::task::spawn_blocking(move || match PdfiumEngine::bind(&library_paths) {
        Ok(engine) => provider.provide(Arc::new(engine)),
        Err(e) => provider.fail(e.to_string()),
    });

    let controller = Controller::new(backend, engine, &config);
    controller.bootstrap_engine().await;

    let outcome = execute(&controller, cli.command).await;
    eprintln!("{}", controller.log().render());
    for alert in controller.log().alerts() {
        eprintln!("alert: {}", alert);
    }
    outcome
}

async fn execute(controller: &Controller, command: Command) -> ViewerResult<()> {
    match command {
        Command::Upload {
            pdf,
            extract,
            describe,
            download,
            out,
        } => {
            let content = tokio::fs::read(&pdf)
                .await
                .map_err(|source| ViewerError::Io {
                    path: pdf.display().to_string(),
                    source,
                })?;
            let filename = pdf
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.pdf".to_string());

            controller.upload(&filename, Bytes::from(content)).await?;
            if extract || describe || download {
                controller.extract().await?;
            }
            if describe {
                controller.describe().await?;
            }
            if download {
                let dir = out.as_deref().unwrap_or(Path::new("."));
                std::fs::create_dir_all(dir).map_err(|source| ViewerError::Io {
                    path: dir.display().to_string(),
                    source,
                })?;
                controller.download_artifacts(dir).await?;
            }
            if let Some(out) = out {
                output::write_report(controller, &out, &filename)?;
            }
        }
        Command::Files { flat } => {
            let grouping = if flat {
                FileGrouping::Flat
            } else {
                FileGrouping::ByPdf
            };
            let catalog = controller.list_files(grouping).await?;
            for entry in catalog.entries() {
                println!("{}\t{}", entry.file_id, entry.label);
            }
        }
        Command::Open {
            file_id,
            describe,
            out,
        } => {
            controller.select_file(&file_id).await?;
            if describe {
                controller.describe().await?;
            }
            if let Some(active) = controller.active_file() {
                let pager = controller.view().pager.label.unwrap_or_default();
                println!("{}\t{}", active, pager);
            }
            if let Some(out) = out {
                output::write_report(controller, &out, &file_id)?;
            }
        }
        Command::Captions {
            file_id,
            query,
            ocr,
            json,
        } => {
            controller.select_file(&file_id).await?;
            controller.apply_filters(CaptionFilter::new(query, ocr));
            controller.select_tab(Tab::Captions);

            match json {
                Some(path) => {
                    let count = controller.export_captions(&path).await?;
                    info!(path = %path.display(), count, "Captions exported");
                }
                None => {
                    let cache = controller.captions();
                    let filter = controller.view().filter;
                    let shown = cache.filter(&filter);
                    for record in &shown {
                        let page = record.pagina.map(|p| p.to_string()).unwrap_or_default();
                        println!("{}\t{}\t{}", record.image_hash, page, record.description);
                    }
                    info!(
                        shown = shown.len(),
                        total = cache.items().len(),
                        described = cache.described_count(),
                        "Captions listed"
                    );
                }
            }
        }
        Command::Pages {
            file_id,
            page: Some(page),
            out,
        } => {
            controller.select_file(&file_id).await?;
            let shown = controller.go_to_page(page)?;
            let Some(canvas) = controller.with_viewer(|viewer| viewer.canvas().cloned()) else {
                return Err(ViewerError::missing(format!("page {} was not painted", shown)));
            };
            match out {
                Some(out) => {
                    output::write_report(controller, &out, &file_id)?;
                }
                None => {
                    println!("page {}: {}x{}", canvas.page, canvas.width(), canvas.height());
                }
            }
        }
        Command::Pages {
            file_id,
            page: None,
            out,
        } => {
            controller.select_file(&file_id).await?;
            let canvases = controller.paint_all_pages()?;
            match out {
                Some(out) => {
                    for canvas in &canvases {
                        output::save_canvas(&out, canvas)?;
                    }
                    output::write_report(controller, &out, &file_id)?;
                }
                None => {
                    for canvas in &canvases {
                        println!("page {}: {}x{}", canvas.page, canvas.width(), canvas.height());
                    }
                }
            }
        }
    }
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let format = fmt::format().with_target(true).compact();

    // Use RUST_LOG if set, otherwise default to info level for our crate.
    // Logs go to stderr; stdout carries command output.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("preproc_viewer=info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .event_format(format)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
