//! crates/docchat_core/src/domain.rs
//!
//! Defines the pure, core data structures for the document chat client.
//! These structs are independent of any transport or serialization format.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Documents
//=========================================================================================

/// An opaque, backend-issued document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a document currently sits in its intake lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Unset,
    /// Checks are running. Validation is synchronous, so this is never observed from outside.
    Validating,
    Uploading,
    Ready,
    Failed,
}

/// The uploaded file as tracked by the client.
///
/// `id` is only assigned once the backend acknowledges the upload and never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Option<DocumentId>,
    pub filename: String,
    pub byte_size: u64,
    pub status: DocumentStatus,
    /// Number of chunks the backend indexed, when it reports one.
    pub chunk_count: Option<u32>,
}

/// A file the user picked, before anything has been sent anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFile {
    pub filename: String,
    /// Declared MIME type, as reported by the picker.
    pub mime_type: String,
    pub bytes: Bytes,
}

impl CandidateFile {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Describes this file as a document that has not been acknowledged yet.
    pub fn to_document(&self, status: DocumentStatus) -> Document {
        Document {
            id: None,
            filename: self.filename.clone(),
            byte_size: self.byte_size(),
            status,
            chunk_count: None,
        }
    }
}

/// What the backend hands back after accepting an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReceipt {
    pub document_id: DocumentId,
    pub filename: Option<String>,
    pub chunk_count: Option<u32>,
}

/// The viewer's position inside the rendered document. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub current: u32,
    pub count: u32,
}

impl PageCursor {
    pub fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.count
    }
}

/// Formats a byte count the way the intake view shows it: `512 bytes`, `1.5 KB`, `2.0 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

//=========================================================================================
// Conversation
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A single entry in a chat thread. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    /// Citation labels in the order the backend returned them.
    pub sources: Vec<String>,
    /// Passed through exactly as received.
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            text: text.into(),
            sources: Vec::new(),
            confidence: None,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(answer: Answer) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            text: answer.text,
            sources: answer.sources,
            confidence: answer.confidence,
            created_at: Utc::now(),
        }
    }
}

/// The backend's answer to one question.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
    pub confidence: Option<f64>,
}

//=========================================================================================
// Summaries
//=========================================================================================

/// What a summary covers: one page, or the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryScope {
    Page(u32),
    Whole,
}

impl fmt::Display for SummaryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryScope::Page(n) => write!(f, "page {}", n),
            SummaryScope::Whole => f.write_str("whole document"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// A snapshot of one summary cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub scope: SummaryScope,
    pub status: SummaryStatus,
    /// The summary when `Ready`, the fallback message when `Failed`.
    pub text: Option<String>,
}

impl SummaryRequest {
    pub fn idle(scope: SummaryScope) -> Self {
        Self { scope, status: SummaryStatus::Idle, text: None }
    }

    pub fn loading(scope: SummaryScope) -> Self {
        Self { scope, status: SummaryStatus::Loading, text: None }
    }

    pub fn ready(scope: SummaryScope, text: impl Into<String>) -> Self {
        Self { scope, status: SummaryStatus::Ready, text: Some(text.into()) }
    }

    pub fn failed(scope: SummaryScope, message: impl Into<String>) -> Self {
        Self { scope, status: SummaryStatus::Failed, text: Some(message.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sizes_use_the_largest_fitting_unit() {
        assert_eq!(format_file_size(512), "512 bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn page_cursor_bounds_are_one_based() {
        let cursor = PageCursor { current: 1, count: 3 };
        assert!(!cursor.contains(0));
        assert!(cursor.contains(3));
        assert!(!cursor.contains(4));
    }
}
