use thiserror::Error;

/// Main client error type
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("{0}")]
    Backend(#[from] BackendError),

    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("Missing precondition: {message}")]
    MissingPrecondition { message: String },

    #[error("Response for file_id={file_id} arrived after the active file changed")]
    Stale { file_id: String },

    #[error("Result belongs to file_id={actual}, expected {expected}")]
    FileMismatch { expected: String, actual: String },

    #[error("Failed to serialize {what}")]
    Serialization {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write image {path}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error at {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors talking to the pre-processing backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Connection failed to {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed (status {status}): {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {url}")]
    InvalidResponse {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}

impl BackendError {
    /// HTTP status for non-success responses
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text shown in the log panel: the response body for non-success
    /// statuses, the error and its cause otherwise
    pub fn detail(&self) -> String {
        match self {
            BackendError::Status { message, .. } if !message.is_empty() => message.clone(),
            other => match std::error::Error::source(other) {
                Some(source) => format!("{}: {}", other, source),
                None => other.to_string(),
            },
        }
    }
}

/// PDF rendering engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Rendering engine unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Failed to open PDF document: {message}")]
    Open { message: String },

    #[error("Failed to render page {page}: {message}")]
    Render { page: u32, message: String },

    #[error("Page {page} is outside 1..={total}")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("No document is loaded in the viewer")]
    NotLoaded,
}

impl EngineError {
    /// Page the failure refers to, if any
    pub fn page(&self) -> Option<u32> {
        match self {
            EngineError::Render { page, .. } | EngineError::PageOutOfRange { page, .. } => {
                Some(*page)
            }
            _ => None,
        }
    }
}

impl ViewerError {
    pub fn missing(message: impl Into<String>) -> Self {
        ViewerError::MissingPrecondition {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ViewerError::Backend(BackendError::Connection { .. }) => "backend_connection",
            ViewerError::Backend(BackendError::Status { .. }) => "backend_status",
            ViewerError::Backend(BackendError::InvalidResponse { .. }) => {
                "backend_invalid_response"
            }
            ViewerError::Backend(BackendError::Client(_)) => "backend_client",
            ViewerError::Engine(EngineError::Unavailable { .. }) => "engine_unavailable",
            ViewerError::Engine(EngineError::Open { .. }) => "engine_open",
            ViewerError::Engine(EngineError::Render { .. }) => "engine_render",
            ViewerError::Engine(EngineError::PageOutOfRange { .. }) => "page_out_of_range",
            ViewerError::Engine(EngineError::NotLoaded) => "viewer_not_loaded",
            ViewerError::MissingPrecondition { .. } => "missing_precondition",
            ViewerError::Stale { .. } => "stale_response",
            ViewerError::FileMismatch { .. } => "file_mismatch",
            ViewerError::Serialization { .. } => "serialization_error",
            ViewerError::Image { .. } => "image_error",
            ViewerError::Config { .. } => "config_error",
            ViewerError::Io { .. } => "io_error",
        }
    }
}

/// Result type alias for client operations
pub type ViewerResult<T> = Result<T, ViewerError>;
