//! services/client/src/views/chat.rs
//!
//! The chat thread for a ready document: an append-only transcript that runs
//! one question/answer exchange at a time.

use docchat_core::domain::{DocumentId, Message};
use docchat_core::ports::{PortError, QuestionAnsweringService};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Shown when the request never produced a usable response.
pub const ASK_FAILED_MESSAGE: &str = "Failed to get an answer. Please try again.";
/// Shown when the backend refused the question without saying why.
pub const ASK_REJECTED_MESSAGE: &str = "Failed to get answer";

/// What happened to one call to [`ChatThread::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, or an exchange was already pending. Nothing changed.
    Ignored,
    Answered,
    Failed,
}

#[derive(Default)]
struct ThreadInner {
    messages: Vec<Message>,
    pending: bool,
    error: Option<String>,
}

pub struct ChatThread {
    document_id: DocumentId,
    answers: Arc<dyn QuestionAnsweringService>,
    inner: Mutex<ThreadInner>,
    revision: watch::Sender<u64>,
}

/// Clears `pending` however the exchange ends, including when the submitting future is dropped.
struct PendingGuard<'a> {
    thread: &'a ChatThread,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.thread.inner.lock().pending = false;
        self.thread.touch();
    }
}

impl ChatThread {
    pub fn new(document_id: DocumentId, answers: Arc<dyn QuestionAnsweringService>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            document_id,
            answers,
            inner: Mutex::new(ThreadInner::default()),
            revision,
        }
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.lock().messages.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_pending(&self) -> bool {
        self.inner.lock().pending
    }

    /// The thread-level error from the most recent exchange, if it failed.
    pub fn error(&self) -> Option<String> {
        self.inner.lock().error.clone()
    }

    /// Ticks every time the thread changes. Views use it to scroll to the latest message.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn touch(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    /// Asks one question.
    ///
    /// The question is appended before the request goes out and stays in the
    /// transcript even if the request fails.
    pub async fn submit(&self, question: &str) -> SubmitOutcome {
        if question.trim().is_empty() {
            debug!("Ignoring blank question.");
            return SubmitOutcome::Ignored;
        }

        {
            let mut inner = self.inner.lock();
            if inner.pending {
                info!("Ignoring question while another exchange is pending.");
                return SubmitOutcome::Ignored;
            }
            inner.messages.push(Message::user(question));
            inner.pending = true;
            inner.error = None;
        }
        self.touch();
        let _pending = PendingGuard { thread: self };

        info!("Asking about document {}.", self.document_id);
        let result = self.answers.ask(question, &self.document_id).await;

        let mut inner = self.inner.lock();
        match result {
            Ok(answer) => {
                inner.messages.push(Message::assistant(answer));
                SubmitOutcome::Answered
            }
            Err(e) => {
                error!("Question about document {} failed: {}", self.document_id, e);
                inner.error = Some(ask_error_message(&e));
                SubmitOutcome::Failed
            }
        }
    }
}

fn ask_error_message(error: &PortError) -> String {
    match error {
        PortError::Rejected { .. } => error.detail().unwrap_or(ASK_REJECTED_MESSAGE).to_string(),
        PortError::Transport(_) | PortError::Unexpected(_) => ASK_FAILED_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use docchat_core::domain::{Answer, Role};
    use std::time::Duration;

    fn thread(backend: Arc<FakeBackend>) -> Arc<ChatThread> {
        Arc::new(ChatThread::new(DocumentId::new("abc123"), backend))
    }

    #[tokio::test]
    async fn answer_fields_are_kept_verbatim() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_answer(Ok(Answer {
            text: "The paper concludes X.".to_string(),
            sources: vec!["p.12".to_string()],
            confidence: Some(0.87),
        }));
        let thread = thread(backend.clone());

        assert_eq!(thread.submit("What is the conclusion?").await, SubmitOutcome::Answered);

        let messages = thread.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "What is the conclusion?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text, "The paper concludes X.");
        assert_eq!(messages[1].sources, vec!["p.12".to_string()]);
        assert_eq!(messages[1].confidence, Some(0.87));
        assert_eq!(
            backend.asked.lock().clone(),
            vec![("What is the conclusion?".to_string(), DocumentId::new("abc123"))]
        );
    }

    #[tokio::test]
    async fn successful_asks_alternate_in_submission_order() {
        let thread = thread(Arc::new(FakeBackend::new()));
        for question in ["one", "two", "three"] {
            thread.submit(question).await;
        }

        let messages = thread.messages();
        assert_eq!(messages.len(), 6);
        for (i, pair) in messages.chunks(2).enumerate() {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(pair[1].text, format!("answer to {}", pair[0].text));
            assert_eq!(pair[0].text, ["one", "two", "three"][i]);
        }
        assert!(!thread.is_pending());
    }

    #[tokio::test]
    async fn failed_ask_keeps_the_question_and_sets_the_backend_detail() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_answer(Err(PortError::Rejected {
            status: 500,
            detail: Some("Question processing failed: index missing".to_string()),
        }));
        let thread = thread(backend);

        assert_eq!(thread.submit("Why?").await, SubmitOutcome::Failed);
        assert_eq!(thread.len(), 1);
        assert_eq!(thread.messages()[0].role, Role::User);
        assert_eq!(thread.error().as_deref(), Some("Question processing failed: index missing"));
        assert!(!thread.is_pending());
    }

    #[tokio::test]
    async fn failures_without_detail_fall_back_to_generic_messages() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_answer(Err(PortError::Rejected { status: 502, detail: None }));
        backend.push_answer(Err(PortError::Transport("connection reset".to_string())));
        let thread = thread(backend);

        thread.submit("first").await;
        assert_eq!(thread.error().as_deref(), Some(ASK_REJECTED_MESSAGE));
        thread.submit("second").await;
        assert_eq!(thread.error().as_deref(), Some(ASK_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn a_new_question_clears_the_previous_error() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_answer(Err(PortError::Transport("down".to_string())));
        let thread = thread(backend);

        thread.submit("first").await;
        assert!(thread.error().is_some());
        thread.submit("second").await;
        assert_eq!(thread.error(), None);
        assert_eq!(thread.len(), 3);
    }

    #[tokio::test]
    async fn blank_questions_are_ignored() {
        let backend = Arc::new(FakeBackend::new());
        let thread = thread(backend.clone());

        assert_eq!(thread.submit("").await, SubmitOutcome::Ignored);
        assert_eq!(thread.submit("   \n\t").await, SubmitOutcome::Ignored);
        assert!(thread.is_empty());
        assert_eq!(backend.ask_calls(), 0);
    }

    #[tokio::test]
    async fn questions_are_ignored_while_one_is_pending() {
        let (backend, release) = FakeBackend::held();
        let backend = Arc::new(backend);
        let thread = thread(backend.clone());

        let first = tokio::spawn({
            let thread = thread.clone();
            async move { thread.submit("first").await }
        });
        while !thread.is_pending() {
            tokio::task::yield_now().await;
        }

        assert_eq!(thread.submit("second").await, SubmitOutcome::Ignored);
        assert_eq!(thread.len(), 1);

        release.add_permits(1);
        assert_eq!(first.await.unwrap(), SubmitOutcome::Answered);
        assert_eq!(thread.len(), 2);
        assert_eq!(backend.ask_calls(), 1);
    }

    #[tokio::test]
    async fn dropping_an_exchange_midway_clears_pending() {
        let (backend, _release) = FakeBackend::held();
        let thread = thread(Arc::new(backend));

        let outcome = tokio::time::timeout(Duration::from_millis(20), thread.submit("stuck?")).await;
        assert!(outcome.is_err());
        assert!(!thread.is_pending());
        assert_eq!(thread.len(), 1);
    }

    #[tokio::test]
    async fn every_mutation_notifies_subscribers() {
        let thread = thread(Arc::new(FakeBackend::new()));
        let mut revisions = thread.subscribe();

        thread.submit("hello").await;
        assert!(revisions.has_changed().unwrap());
        assert!(*revisions.borrow_and_update() >= 2);
    }
}
