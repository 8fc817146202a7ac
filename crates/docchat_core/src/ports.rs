//! crates/docchat_core/src/ports.rs
//!
//! Defines the service contracts (traits) the orchestration layer uses to reach
//! the analysis backend. These traits form the boundary of the hexagonal
//! architecture, so the session logic never depends on a concrete transport.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{Answer, CandidateFile, DocumentId, DocumentReceipt, SummaryScope};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// The backend answered with a non-success status.
    #[error("Backend rejected the request with status {status}")]
    Rejected { status: u16, detail: Option<String> },
    /// The request never produced a response.
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// The structured, user-facing message the backend attached, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            PortError::Rejected { detail: Some(detail), .. } if !detail.trim().is_empty() => {
                Some(detail.as_str())
            }
            _ => None,
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DocumentUploadService: Send + Sync {
    /// Sends the file to the backend on behalf of `caller_id`.
    async fn upload_document(&self, file: &CandidateFile, caller_id: &str) -> PortResult<DocumentReceipt>;
}

#[async_trait]
pub trait QuestionAnsweringService: Send + Sync {
    /// Answers a question about an already uploaded document.
    async fn ask(&self, question: &str, document_id: &DocumentId) -> PortResult<Answer>;
}

#[async_trait]
pub trait SummaryService: Send + Sync {
    async fn summarize(&self, document_id: &DocumentId, scope: SummaryScope) -> PortResult<String>;
}

#[async_trait]
pub trait DocumentContentService: Send + Sync {
    /// Fetches the raw document bytes for the viewer.
    async fn fetch_document(&self, document_id: &DocumentId) -> PortResult<Bytes>;
}
