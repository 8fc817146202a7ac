//! services/client/src/views/state.rs
//!
//! Defines the client's shared state and the per-navigation session context.

use crate::adapters::HttpBackend;
use crate::config::Config;
use docchat_core::domain::DocumentId;
use docchat_core::ports::{
    DocumentContentService, DocumentUploadService, QuestionAnsweringService, SummaryService,
};
use std::sync::Arc;

//=========================================================================================
// ClientState (Shared Across All Views)
//=========================================================================================

/// The shared client state, created once at startup and handed to every view.
#[derive(Clone)]
pub struct ClientState {
    pub config: Arc<Config>,
    pub uploads: Arc<dyn DocumentUploadService>,
    pub answers: Arc<dyn QuestionAnsweringService>,
    pub summaries: Arc<dyn SummaryService>,
    pub content: Arc<dyn DocumentContentService>,
}

impl ClientState {
    /// Wires every port to the same HTTP backend.
    pub fn with_http_backend(config: Arc<Config>, backend: HttpBackend) -> Self {
        let backend = Arc::new(backend);
        Self {
            config,
            uploads: backend.clone(),
            answers: backend.clone(),
            summaries: backend.clone(),
            content: backend,
        }
    }
}

//=========================================================================================
// SessionContext (Specific to One Navigation)
//=========================================================================================

/// Whether the user currently has a ready document to talk about.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionContext {
    #[default]
    NoDocument,
    ActiveDocument(DocumentId),
}

impl SessionContext {
    pub fn document_id(&self) -> Option<&DocumentId> {
        match self {
            SessionContext::NoDocument => None,
            SessionContext::ActiveDocument(id) => Some(id),
        }
    }
}

/// The two views the client can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Intake,
    Chat,
}
