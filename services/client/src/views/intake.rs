//! services/client/src/views/intake.rs
//!
//! The upload session: a state machine that owns one document's intake, from
//! file selection through the backend's acknowledgement or failure.

use crate::config::ProgressSettings;
use crate::views::progress_task::ProgressTicker;
use crate::views::state::ClientState;
use docchat_core::domain::{CandidateFile, Document, DocumentId, DocumentStatus};
use docchat_core::ports::{DocumentUploadService, PortError};
use docchat_core::validation::{Rejection, Validator};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload the PDF. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("An upload is already in progress")]
    UploadInFlight,
    #[error("No file has been selected")]
    NoFileSelected,
    #[error("There is no failed upload to retry")]
    NothingToRetry,
    #[error("{message}")]
    Upload { message: String, source: PortError },
    /// The session was reset while the backend was still working.
    #[error("The upload was abandoned before the backend answered")]
    Abandoned,
}

/// The externally visible phase of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    FileSelected,
    Uploading,
    Succeeded,
    Failed,
}

/// A consistent copy of the session, taken under one lock.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSnapshot {
    pub phase: UploadPhase,
    pub progress_percent: u8,
    pub error_message: Option<String>,
    pub document: Option<Document>,
}

enum UploadState {
    Idle,
    FileSelected(CandidateFile),
    Uploading {
        file: CandidateFile,
        attempt: u64,
        // Dropped on every exit from `Uploading`, which stops the timer.
        _ticker: ProgressTicker,
    },
    Succeeded(Document),
    Failed(CandidateFile),
}

impl UploadState {
    fn phase(&self) -> UploadPhase {
        match self {
            UploadState::Idle => UploadPhase::Idle,
            UploadState::FileSelected(_) => UploadPhase::FileSelected,
            UploadState::Uploading { .. } => UploadPhase::Uploading,
            UploadState::Succeeded(_) => UploadPhase::Succeeded,
            UploadState::Failed(_) => UploadPhase::Failed,
        }
    }

    fn document(&self) -> Option<Document> {
        match self {
            UploadState::Idle => None,
            UploadState::FileSelected(file) => Some(file.to_document(DocumentStatus::Unset)),
            UploadState::Uploading { file, .. } => Some(file.to_document(DocumentStatus::Uploading)),
            UploadState::Succeeded(document) => Some(document.clone()),
            UploadState::Failed(file) => Some(file.to_document(DocumentStatus::Failed)),
        }
    }
}

pub(crate) struct IntakeInner {
    state: UploadState,
    progress_percent: u8,
    error_message: Option<String>,
    attempts: u64,
}

impl Default for IntakeInner {
    fn default() -> Self {
        Self {
            state: UploadState::Idle,
            progress_percent: 0,
            error_message: None,
            attempts: 0,
        }
    }
}

impl IntakeInner {
    /// One progress tick. Returns `false` once there is nothing left to animate.
    pub(crate) fn advance_progress(&mut self, attempt: u64, settings: &ProgressSettings) -> bool {
        match &self.state {
            UploadState::Uploading { attempt: current, .. } if *current == attempt => {
                let next = self
                    .progress_percent
                    .saturating_add(settings.step)
                    .min(settings.cap)
                    .max(self.progress_percent);
                self.progress_percent = next;
                next < settings.cap
            }
            _ => false,
        }
    }

    fn is_current_attempt(&self, attempt: u64) -> bool {
        matches!(&self.state, UploadState::Uploading { attempt: current, .. } if *current == attempt)
    }
}

//=========================================================================================
// UploadSession
//=========================================================================================

pub struct UploadSession {
    inner: Arc<Mutex<IntakeInner>>,
    uploads: Arc<dyn DocumentUploadService>,
    validator: Validator,
    progress: ProgressSettings,
    caller_id: String,
}

impl UploadSession {
    pub fn new(
        uploads: Arc<dyn DocumentUploadService>,
        validator: Validator,
        progress: ProgressSettings,
        caller_id: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(IntakeInner::default())),
            uploads,
            validator,
            progress,
            caller_id: caller_id.into(),
        }
    }

    pub fn from_state(state: &ClientState) -> Self {
        Self::new(
            state.uploads.clone(),
            Validator::new(state.config.upload_constraints.clone()),
            state.config.progress,
            state.config.user_id.clone(),
        )
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        let inner = self.inner.lock();
        UploadSnapshot {
            phase: inner.state.phase(),
            progress_percent: inner.progress_percent,
            error_message: inner.error_message.clone(),
            document: inner.state.document(),
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.inner.lock().state.phase()
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.phase() == UploadPhase::FileSelected
    }

    /// The backend-issued id, once the upload has succeeded.
    pub fn document_id(&self) -> Option<DocumentId> {
        match &self.inner.lock().state {
            UploadState::Succeeded(document) => document.id.clone(),
            _ => None,
        }
    }

    /// Validates and selects a file. Selecting from `Succeeded` or `Failed` starts over
    /// with the new file; an invalid file leaves the session `Idle` with the reason shown.
    pub fn select_file(&self, file: CandidateFile) -> Result<(), IntakeError> {
        let mut inner = self.inner.lock();
        if inner.state.phase() == UploadPhase::Uploading {
            warn!("Ignoring file selection for '{}': an upload is in flight.", file.filename);
            return Err(IntakeError::UploadInFlight);
        }

        inner.progress_percent = 0;
        match self.validator.validate(&file).map(|_| ()) {
            Ok(_) => {
                info!("Selected '{}' ({} bytes).", file.filename, file.byte_size());
                inner.state = UploadState::FileSelected(file);
                inner.error_message = None;
                Ok(())
            }
            Err(rejection) => {
                warn!("Rejected '{}': {}", file.filename, rejection);
                inner.state = UploadState::Idle;
                inner.error_message = Some(rejection.to_string());
                Err(rejection.into())
            }
        }
    }

    /// Uploads the selected file and waits for the backend's answer.
    ///
    /// The session's state already reflects the outcome when this returns; the
    /// result is handed back for callers that want to act on it directly.
    pub async fn submit(&self) -> Result<Document, IntakeError> {
        let (file, attempt) = {
            let mut inner = self.inner.lock();
            let file = match &inner.state {
                UploadState::FileSelected(file) => file.clone(),
                UploadState::Uploading { .. } => return Err(IntakeError::UploadInFlight),
                _ => return Err(IntakeError::NoFileSelected),
            };
            inner.attempts += 1;
            let attempt = inner.attempts;
            let ticker = ProgressTicker::spawn(Arc::downgrade(&self.inner), attempt, self.progress);
            inner.state = UploadState::Uploading {
                file: file.clone(),
                attempt,
                _ticker: ticker,
            };
            inner.progress_percent = 0;
            inner.error_message = None;
            (file, attempt)
        };

        info!("Uploading '{}' (attempt {}).", file.filename, attempt);
        let result = self.uploads.upload_document(&file, &self.caller_id).await;

        let mut inner = self.inner.lock();
        if !inner.is_current_attempt(attempt) {
            warn!("Discarding the backend's answer for abandoned upload attempt {}.", attempt);
            return Err(IntakeError::Abandoned);
        }

        match result {
            Ok(receipt) => {
                info!("Upload of '{}' acknowledged as document {}.", file.filename, receipt.document_id);
                let document = Document {
                    id: Some(receipt.document_id),
                    filename: file.filename.clone(),
                    byte_size: file.byte_size(),
                    status: DocumentStatus::Ready,
                    chunk_count: receipt.chunk_count,
                };
                inner.state = UploadState::Succeeded(document.clone());
                inner.progress_percent = 100;
                Ok(document)
            }
            Err(e) => {
                error!("Upload of '{}' failed: {}", file.filename, e);
                let message = e.detail().unwrap_or(UPLOAD_FAILED_MESSAGE).to_string();
                inner.state = UploadState::Failed(file);
                inner.error_message = Some(message.clone());
                Err(IntakeError::Upload { message, source: e })
            }
        }
    }

    /// Puts the file from a failed upload back up for submission.
    pub fn retry(&self) -> Result<(), IntakeError> {
        let mut inner = self.inner.lock();
        match std::mem::replace(&mut inner.state, UploadState::Idle) {
            UploadState::Failed(file) => {
                info!("Retrying '{}'.", file.filename);
                inner.state = UploadState::FileSelected(file);
                inner.error_message = None;
                Ok(())
            }
            other => {
                inner.state = other;
                Err(IntakeError::NothingToRetry)
            }
        }
    }

    /// Returns to `Idle`, dropping the file, the document, and any running progress task.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = UploadState::Idle;
        inner.progress_percent = 0;
        inner.error_message = None;
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        // The progress task only holds a weak reference, but it may be mid-tick.
        self.inner.lock().state = UploadState::Idle;
    }
}
