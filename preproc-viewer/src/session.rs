//! Extraction view-model.
//!
//! The [`Session`] holds the active file, the page counters and the latest
//! extraction result. Every change of the active file starts a new
//! generation: the previous file's cancellation token fires and responses
//! tagged with an older generation are rejected by [`Session::is_current`].
//!
//! Loading a stored file goes through a pending switch: the ticket is valid
//! while the load is in flight, but the active file only changes once the
//! load is committed.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::model::ExtractionResult;

/// Identifies the active file at the moment a request was issued
#[derive(Debug, Clone)]
pub struct RequestTicket {
    pub file_id: String,
    pub generation: u64,
    pub cancel: CancellationToken,
}

/// What `set_active_file` changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    /// Same file as before, nothing to invalidate
    Unchanged,
    /// A different file became active; file-scoped caches must be dropped
    Switched,
}

/// Client session state
#[derive(Debug, Default)]
pub struct Session {
    file_id: Option<String>,
    total_pages: u32,
    current_page: u32,
    extract: Option<ExtractionResult>,
    generation: u64,
    cancel: CancellationToken,
    /// Last generation handed out, active or pending
    issued: u64,
    pending: Option<RequestTicket>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            ..Self::default()
        }
    }

    pub fn file_id(&self) -> Option<&str> {
        self.file_id.as_deref()
    }

    pub fn extract(&self) -> Option<&ExtractionResult> {
        self.extract.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Make `file_id` the active file.
    ///
    /// A different id bumps the generation, cancels requests issued for the
    /// previous file (and any pending switch) and drops the previous
    /// extraction and page counters.
    pub fn set_active_file(&mut self, file_id: &str) -> FileChange {
        if self.file_id.as_deref() == Some(file_id) {
            return FileChange::Unchanged;
        }

        if let Some(pending) = self.pending.take() {
            pending.cancel.cancel();
        }
        let generation = self.next_generation();
        self.switch_to(file_id, generation, CancellationToken::new());
        FileChange::Switched
    }

    /// Ticket for loading `file_id` without making it active yet.
    ///
    /// Supersedes any earlier pending switch. Asking for the active file
    /// returns its current ticket.
    pub fn begin_switch(&mut self, file_id: &str) -> RequestTicket {
        if let Some(previous) = self.pending.take() {
            previous.cancel.cancel();
        }

        if self.file_id.as_deref() == Some(file_id) {
            return RequestTicket {
                file_id: file_id.to_string(),
                generation: self.generation,
                cancel: self.cancel.clone(),
            };
        }

        let ticket = RequestTicket {
            file_id: file_id.to_string(),
            generation: self.next_generation(),
            cancel: CancellationToken::new(),
        };
        debug!(file_id = %file_id, generation = ticket.generation, "Pending file switch");
        self.pending = Some(ticket.clone());
        ticket
    }

    /// Make the pending switch of `ticket` the active file
    pub fn commit_switch(&mut self, ticket: &RequestTicket) -> FileChange {
        if !self.is_pending(ticket) {
            return FileChange::Unchanged;
        }

        self.pending = None;
        self.switch_to(&ticket.file_id, ticket.generation, ticket.cancel.clone());
        FileChange::Switched
    }

    /// Drop the pending switch of `ticket`, leaving the active file as it was
    pub fn abandon_switch(&mut self, ticket: &RequestTicket) {
        if self.is_pending(ticket) {
            self.pending = None;
            debug!(file_id = %ticket.file_id, generation = ticket.generation, "Pending file switch abandoned");
        }
    }

    fn is_pending(&self, ticket: &RequestTicket) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| pending.generation == ticket.generation)
    }

    fn next_generation(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn switch_to(&mut self, file_id: &str, generation: u64, cancel: CancellationToken) {
        self.cancel.cancel();
        self.cancel = cancel;
        self.generation = generation;
        self.file_id = Some(file_id.to_string());
        self.extract = None;
        self.total_pages = 0;
        self.current_page = 1;

        debug!(file_id = %file_id, generation = generation, "Active file changed");
    }

    /// Replace the extraction result wholesale
    pub fn set_extract(&mut self, result: ExtractionResult) {
        self.extract = Some(result);
    }

    /// Record the page counters reported by the viewer
    pub fn set_pages(&mut self, current: u32, total: u32) {
        self.total_pages = total;
        self.current_page = if total == 0 {
            1
        } else {
            current.clamp(1, total)
        };
    }

    /// Token cancelled when the active file changes
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Ticket for a request about the active file
    pub fn ticket(&self) -> Option<RequestTicket> {
        self.file_id.as_ref().map(|file_id| RequestTicket {
            file_id: file_id.clone(),
            generation: self.generation,
            cancel: self.cancel.clone(),
        })
    }

    /// Whether a response for `ticket` may still be applied
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        let active = ticket.generation == self.generation
            && self.file_id.as_deref() == Some(&ticket.file_id);
        active || self.is_pending(ticket)
    }
}
