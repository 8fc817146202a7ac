//! In-memory stand-ins for the backend ports, used by the unit tests.

use crate::config::Config;
use crate::views::state::ClientState;
use async_trait::async_trait;
use bytes::Bytes;
use docchat_core::domain::{Answer, CandidateFile, DocumentId, DocumentReceipt, SummaryScope};
use docchat_core::ports::{
    DocumentContentService, DocumentUploadService, PortResult, QuestionAnsweringService,
    SummaryService,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Scripted backend. Queued results are returned first; afterwards every call succeeds
/// with a canned value. A held backend makes each call wait for one semaphore permit.
#[derive(Default)]
pub(crate) struct FakeBackend {
    uploads: Mutex<VecDeque<PortResult<DocumentReceipt>>>,
    answers: Mutex<VecDeque<PortResult<Answer>>>,
    summaries: Mutex<VecDeque<PortResult<String>>>,
    upload_calls: AtomicUsize,
    ask_calls: AtomicUsize,
    summary_calls: AtomicUsize,
    pub asked: Mutex<Vec<(String, DocumentId)>>,
    pub summarized: Mutex<Vec<(DocumentId, SummaryScope)>>,
    hold: Option<Arc<Semaphore>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Self {
            hold: Some(gate.clone()),
            ..Self::default()
        };
        (backend, gate)
    }

    pub fn push_upload(&self, result: PortResult<DocumentReceipt>) {
        self.uploads.lock().push_back(result);
    }

    pub fn push_answer(&self, result: PortResult<Answer>) {
        self.answers.lock().push_back(result);
    }

    pub fn push_summary(&self, result: PortResult<String>) {
        self.summaries.lock().push_back(result);
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn ask_calls(&self) -> usize {
        self.ask_calls.load(Ordering::SeqCst)
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    async fn wait_for_release(&self) {
        if let Some(gate) = &self.hold {
            gate.acquire().await.expect("gate closed").forget();
        }
    }
}

#[async_trait]
impl DocumentUploadService for FakeBackend {
    async fn upload_document(&self, _file: &CandidateFile, _caller_id: &str) -> PortResult<DocumentReceipt> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_release().await;
        self.uploads.lock().pop_front().unwrap_or_else(|| {
            Ok(DocumentReceipt {
                document_id: DocumentId::new("doc-1"),
                filename: None,
                chunk_count: None,
            })
        })
    }
}

#[async_trait]
impl QuestionAnsweringService for FakeBackend {
    async fn ask(&self, question: &str, document_id: &DocumentId) -> PortResult<Answer> {
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        self.asked.lock().push((question.to_string(), document_id.clone()));
        self.wait_for_release().await;
        self.answers.lock().pop_front().unwrap_or_else(|| {
            Ok(Answer {
                text: format!("answer to {}", question),
                sources: Vec::new(),
                confidence: None,
            })
        })
    }
}

#[async_trait]
impl SummaryService for FakeBackend {
    async fn summarize(&self, document_id: &DocumentId, scope: SummaryScope) -> PortResult<String> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        self.summarized.lock().push((document_id.clone(), scope));
        self.wait_for_release().await;
        self.summaries
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("summary of {} ({})", scope, document_id)))
    }
}

#[async_trait]
impl DocumentContentService for FakeBackend {
    async fn fetch_document(&self, _document_id: &DocumentId) -> PortResult<Bytes> {
        Ok(Bytes::from_static(b"%PDF-1.7"))
    }
}

pub(crate) fn test_config() -> Config {
    Config::from_lookup(|key| (key == "USER_ID").then(|| "tester".to_string())).expect("test config")
}

pub(crate) fn fake_state(backend: Arc<FakeBackend>) -> ClientState {
    ClientState {
        config: Arc::new(test_config()),
        uploads: backend.clone(),
        answers: backend.clone(),
        summaries: backend.clone(),
        content: backend,
    }
}
