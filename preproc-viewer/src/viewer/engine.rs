//! Rendering engine seam and its one-shot bootstrap.
//!
//! The host binds the engine once through an [`EngineProvider`]; the
//! viewer side waits on the matching [`EngineSlot`] with a bounded
//! timeout and gets a typed [`EngineReadiness`] back.

use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::EngineError;

/// A painted page
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    /// 1-based page number
    pub page: u32,
    pub image: RgbaImage,
}

impl Canvas {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// An opened PDF document
pub trait DocumentHandle {
    fn page_count(&self) -> u32;

    /// Paint one page (1-based) onto a new canvas sized to the zoomed viewport
    fn render_page(&self, page: u32, zoom: f32) -> Result<Canvas, EngineError>;
}

/// The external PDF rendering engine
pub trait RenderEngine: Send + Sync {
    fn name(&self) -> &str;

    fn open(&self, content: Vec<u8>) -> Result<Box<dyn DocumentHandle>, EngineError>;
}

/// Outcome of waiting for the engine
#[derive(Clone)]
pub enum EngineReadiness {
    Ready(Arc<dyn RenderEngine>),
    Unavailable { reason: String },
}

impl std::fmt::Debug for EngineReadiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineReadiness::Ready(engine) => f.debug_tuple("Ready").field(&engine.name()).finish(),
            EngineReadiness::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

#[derive(Clone)]
enum SlotState {
    Pending,
    Resolved(EngineReadiness),
}

/// Host side of the bootstrap; consumed by the single resolution
pub struct EngineProvider {
    tx: watch::Sender<SlotState>,
}

impl EngineProvider {
    pub fn provide(self, engine: Arc<dyn RenderEngine>) {
        debug!(engine = %engine.name(), "Rendering engine provided");
        self.tx
            .send_replace(SlotState::Resolved(EngineReadiness::Ready(engine)));
    }

    pub fn fail(self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(reason = %reason, "Rendering engine failed to initialize");
        self.tx
            .send_replace(SlotState::Resolved(EngineReadiness::Unavailable { reason }));
    }
}

/// Viewer side of the bootstrap
#[derive(Clone)]
pub struct EngineSlot {
    rx: watch::Receiver<SlotState>,
}

impl EngineSlot {
    pub fn new() -> (EngineSlot, EngineProvider) {
        let (tx, rx) = watch::channel(SlotState::Pending);
        (EngineSlot { rx }, EngineProvider { tx })
    }

    /// Slot that is already resolved with `engine`
    pub fn ready(engine: Arc<dyn RenderEngine>) -> EngineSlot {
        let (slot, provider) = Self::new();
        provider.provide(engine);
        slot
    }

    /// Current engine, without waiting
    #[cfg(test)]
    pub fn engine(&self) -> Option<Arc<dyn RenderEngine>> {
        match &*self.rx.borrow() {
            SlotState::Resolved(EngineReadiness::Ready(engine)) => Some(engine.clone()),
            _ => None,
        }
    }

    /// Reason the engine is unavailable; `None` while pending or when ready
    #[cfg(test)]
    pub fn failure(&self) -> Option<String> {
        match &*self.rx.borrow() {
            SlotState::Resolved(EngineReadiness::Unavailable { reason }) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Wait until the host resolves the slot, at most `timeout`
    pub async fn wait(&self, timeout: Duration) -> EngineReadiness {
        let mut rx = self.rx.clone();
        let resolved = tokio::time::timeout(
            timeout,
            rx.wait_for(|state| matches!(state, SlotState::Resolved(_))),
        )
        .await;

        match resolved {
            Ok(Ok(state)) => match &*state {
                SlotState::Resolved(readiness) => readiness.clone(),
                SlotState::Pending => EngineReadiness::Unavailable {
                    reason: "engine slot still pending".to_string(),
                },
            },
            // Provider dropped without resolving
            Ok(Err(_)) => EngineReadiness::Unavailable {
                reason: "engine provider dropped before initialization".to_string(),
            },
            Err(_) => EngineReadiness::Unavailable {
                reason: format!("engine not ready after {}ms", timeout.as_millis()),
            },
        }
    }
}
