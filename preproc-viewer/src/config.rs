//! Viewer configuration.
//!
//! Settings come from an optional `preproc-viewer` config file and
//! `PREPROC__*` environment variables; command line flags override a few
//! of them after loading.

mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use loader::load_config;

/// Complete client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_backend")]
    pub backend: BackendConfig,

    #[serde(default = "default_viewer")]
    pub viewer: PageViewerConfig,

    #[serde(default = "default_ui")]
    pub ui: UiConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            viewer: default_viewer(),
            ui: default_ui(),
        }
    }
}

/// Pre-processing backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Extraction of large PDFs runs inside a single request, so this is generous.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// PDF page viewer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageViewerConfig {
    /// Zoom factor applied to every painted page
    #[serde(default = "default_zoom")]
    pub zoom: f32,

    /// How long to wait for the rendering engine to become available
    #[serde(default = "default_engine_wait_ms")]
    pub engine_wait_ms: u64,

    /// Directories searched for libpdfium before the system library paths
    #[serde(default = "default_pdfium_library_paths")]
    pub pdfium_library_paths: Vec<PathBuf>,
}

impl PageViewerConfig {
    pub fn engine_wait(&self) -> Duration {
        Duration::from_millis(self.engine_wait_ms)
    }
}

/// User interface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_locale")]
    pub locale: String,
}

// ==================== Default Value Functions ====================

fn default_backend() -> BackendConfig {
    BackendConfig {
        base_url: default_base_url(),
        request_timeout_secs: default_request_timeout_secs(),
        user_agent: default_user_agent(),
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8099".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_user_agent() -> String {
    format!("preproc-viewer/{}", env!("CARGO_PKG_VERSION"))
}

fn default_viewer() -> PageViewerConfig {
    PageViewerConfig {
        zoom: default_zoom(),
        engine_wait_ms: default_engine_wait_ms(),
        pdfium_library_paths: default_pdfium_library_paths(),
    }
}

fn default_zoom() -> f32 {
    1.3
}

fn default_engine_wait_ms() -> u64 {
    // 50 polls of 100ms
    5_000
}

fn default_pdfium_library_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("./"), PathBuf::from("./vendor/pdfium/lib/")]
}

fn default_ui() -> UiConfig {
    UiConfig {
        locale: default_locale(),
    }
}

fn default_locale() -> String {
    "en".to_string()
}
