//! services/client/src/views/app.rs
//!
//! Ties the views together: intake feeds the session context, the gate reads it,
//! and an admitted chat view owns a fresh thread and summary cache.

use crate::views::chat::{ChatThread, SubmitOutcome};
use crate::views::gate::{GateDecision, SessionGate};
use crate::views::intake::{IntakeError, UploadSession, UploadSnapshot};
use crate::views::state::{ClientState, Route, SessionContext};
use crate::views::summary::SummaryCache;
use bytes::Bytes;
use docchat_core::domain::{CandidateFile, Document, DocumentId, PageCursor, SummaryRequest, SummaryScope};
use docchat_core::ports::{DocumentContentService, PortResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

//=========================================================================================
// ClientApp
//=========================================================================================

pub struct ClientApp {
    state: ClientState,
    context: watch::Sender<SessionContext>,
    intake: UploadSession,
    route: Mutex<Route>,
}

impl ClientApp {
    pub fn new(state: ClientState) -> Self {
        let intake = UploadSession::from_state(&state);
        let (context, _) = watch::channel(SessionContext::NoDocument);
        Self {
            state,
            context,
            intake,
            route: Mutex::new(Route::Intake),
        }
    }

    /// What the intake view currently shows.
    pub fn intake(&self) -> UploadSnapshot {
        self.intake.snapshot()
    }

    pub fn context(&self) -> SessionContext {
        self.context.borrow().clone()
    }

    pub fn route(&self) -> Route {
        *self.route.lock()
    }

    /// A gate bound to this app's session context.
    pub fn gate(&self) -> SessionGate {
        SessionGate::new(self.context.subscribe())
    }

    /// Picks a file for the next upload. Once the intake no longer holds a ready
    /// document, the previous one stops being active, whether or not the file is valid.
    pub fn select_file(&self, file: CandidateFile) -> Result<(), IntakeError> {
        let result = self.intake.select_file(file);
        if self.intake.document_id().is_none() {
            self.release_document();
        }
        result
    }

    /// Puts the file from a failed upload back up for submission.
    pub fn retry(&self) -> Result<(), IntakeError> {
        self.intake.retry()
    }

    /// Submits the selected file; on success the document becomes the active one.
    pub async fn upload(&self) -> Result<Document, IntakeError> {
        let document = self.intake.submit().await?;
        if let Some(id) = &document.id {
            info!("Document {} is ready.", id);
            self.context.send_replace(SessionContext::ActiveDocument(id.clone()));
        }
        Ok(document)
    }

    /// Navigates to the chat view. Without an active document nothing is built and
    /// the route to show instead is returned.
    pub fn open_chat(&self) -> Result<ChatView, Route> {
        match self.gate().enter() {
            GateDecision::Admit(document_id) => {
                *self.route.lock() = Route::Chat;
                Ok(ChatView::new(&self.state, document_id))
            }
            GateDecision::Redirect(route) => {
                *self.route.lock() = route;
                Err(route)
            }
        }
    }

    /// Drops the current document. Any open chat view should be discarded with it.
    pub fn start_new_upload(&self) {
        info!("Starting a new upload.");
        self.intake.reset();
        self.release_document();
    }

    fn release_document(&self) {
        self.context.send_if_modified(|context| {
            let Some(id) = context.document_id().cloned() else {
                return false;
            };
            info!("Document {} is no longer active.", id);
            *context = SessionContext::NoDocument;
            true
        });
        *self.route.lock() = Route::Intake;
    }
}

//=========================================================================================
// ChatView
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Page {page} is outside the document (1..={count})")]
pub struct PageOutOfRange {
    pub page: u32,
    pub count: u32,
}

/// Everything the chat view shows for one ready document.
pub struct ChatView {
    document_id: DocumentId,
    thread: ChatThread,
    summaries: SummaryCache,
    content: Arc<dyn DocumentContentService>,
    cursor: Option<PageCursor>,
}

impl ChatView {
    fn new(state: &ClientState, document_id: DocumentId) -> Self {
        Self {
            thread: ChatThread::new(document_id.clone(), state.answers.clone()),
            summaries: SummaryCache::for_document(state.summaries.clone(), document_id.clone()),
            content: state.content.clone(),
            cursor: None,
            document_id,
        }
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn thread(&self) -> &ChatThread {
        &self.thread
    }

    pub fn summaries(&self) -> &SummaryCache {
        &self.summaries
    }

    pub fn page_cursor(&self) -> Option<PageCursor> {
        self.cursor
    }

    /// Records what the document viewer currently shows.
    pub fn set_page_cursor(&mut self, cursor: PageCursor) {
        self.cursor = Some(cursor);
    }

    pub async fn ask(&self, question: &str) -> SubmitOutcome {
        self.thread.submit(question).await
    }

    pub async fn summarize_document(&self) -> SummaryRequest {
        self.summaries.request_summary(&self.document_id, SummaryScope::Whole).await
    }

    pub async fn summarize_page(&self, page: u32) -> Result<SummaryRequest, PageOutOfRange> {
        let in_range = match self.cursor {
            Some(cursor) => cursor.contains(page),
            None => page >= 1,
        };
        if !in_range {
            return Err(PageOutOfRange {
                page,
                count: self.cursor.map(|c| c.count).unwrap_or(0),
            });
        }
        Ok(self.summaries.request_summary(&self.document_id, SummaryScope::Page(page)).await)
    }

    /// Summarizes the page the viewer is on, if the viewer has reported one.
    pub async fn summarize_current_page(&self) -> Option<SummaryRequest> {
        let cursor = self.cursor?;
        self.summarize_page(cursor.current).await.ok()
    }

    /// The raw document bytes for the viewer.
    pub async fn fetch_document(&self) -> PortResult<Bytes> {
        self.content.fetch_document(&self.document_id).await
    }
}
