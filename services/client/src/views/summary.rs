//! services/client/src/views/summary.rs
//!
//! Page and whole-document summaries, cached per document and de-duplicated
//! while a request for the same scope is still in flight.

use docchat_core::domain::{DocumentId, SummaryRequest, SummaryScope, SummaryStatus};
use docchat_core::ports::SummaryService;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const SUMMARY_FAILED_MESSAGE: &str = "Failed to generate summary. Please try again.";

enum Entry {
    /// Resolves to `Some` once the request settles.
    Loading(watch::Receiver<Option<SummaryRequest>>),
    Settled(SummaryRequest),
}

#[derive(Default)]
struct CacheInner {
    document_id: Option<DocumentId>,
    /// Bumped whenever entries are discarded, so late completions for a
    /// previous document are not written back.
    generation: u64,
    entries: HashMap<SummaryScope, Entry>,
}

impl CacheInner {
    fn bind(&mut self, document_id: &DocumentId) {
        if self.document_id.as_ref() != Some(document_id) {
            if let Some(previous) = &self.document_id {
                info!("Discarding summaries of {} for document {}.", previous, document_id);
            }
            self.entries.clear();
            self.generation += 1;
            self.document_id = Some(document_id.clone());
        }
    }
}

pub struct SummaryCache {
    summaries: Arc<dyn SummaryService>,
    inner: Arc<Mutex<CacheInner>>,
}

impl SummaryCache {
    pub fn new(summaries: Arc<dyn SummaryService>) -> Self {
        Self {
            summaries,
            inner: Arc::new(Mutex::new(CacheInner::default())),
        }
    }

    pub fn for_document(summaries: Arc<dyn SummaryService>, document_id: DocumentId) -> Self {
        let cache = Self::new(summaries);
        cache.inner.lock().bind(&document_id);
        cache
    }

    pub fn document_id(&self) -> Option<DocumentId> {
        self.inner.lock().document_id.clone()
    }

    /// Returns a cached `Ready` summary, joins an identical in-flight request, or
    /// starts a new one. A request for a different document empties the cache first.
    pub async fn request_summary(&self, document_id: &DocumentId, scope: SummaryScope) -> SummaryRequest {
        let mut settled = {
            let mut inner = self.inner.lock();
            inner.bind(document_id);
            match inner.entries.get(&scope) {
                Some(Entry::Settled(request)) if request.status == SummaryStatus::Ready => {
                    debug!("Summary of {} served from cache.", scope);
                    return request.clone();
                }
                Some(Entry::Loading(pending)) => {
                    debug!("Joining the in-flight summary request for {}.", scope);
                    pending.clone()
                }
                _ => {
                    let (tx, rx) = watch::channel(None);
                    inner.entries.insert(scope, Entry::Loading(rx.clone()));
                    self.spawn_request(document_id.clone(), scope, inner.generation, tx);
                    rx
                }
            }
        };

        let result = settled
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|value| (*value).clone());
        result.unwrap_or_else(|| SummaryRequest::failed(scope, SUMMARY_FAILED_MESSAGE))
    }

    /// The current state of one scope, without waiting or fetching.
    pub fn peek(&self, scope: SummaryScope) -> SummaryRequest {
        match self.inner.lock().entries.get(&scope) {
            None => SummaryRequest::idle(scope),
            Some(Entry::Loading(_)) => SummaryRequest::loading(scope),
            Some(Entry::Settled(request)) => request.clone(),
        }
    }

    /// Drops every entry. In-flight requests still complete for their callers but are not cached.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.generation += 1;
    }

    fn spawn_request(
        &self,
        document_id: DocumentId,
        scope: SummaryScope,
        generation: u64,
        tx: watch::Sender<Option<SummaryRequest>>,
    ) {
        let summaries = self.summaries.clone();
        let cache: Weak<Mutex<CacheInner>> = Arc::downgrade(&self.inner);
        info!("Requesting summary of {} for document {}.", scope, document_id);

        tokio::spawn(async move {
            let request = match summaries.summarize(&document_id, scope).await {
                Ok(text) => SummaryRequest::ready(scope, text),
                Err(e) => {
                    warn!("Summary of {} for document {} failed: {}", scope, document_id, e);
                    SummaryRequest::failed(scope, SUMMARY_FAILED_MESSAGE)
                }
            };

            if let Some(cache) = cache.upgrade() {
                let mut inner = cache.lock();
                if inner.generation == generation {
                    inner.entries.insert(scope, Entry::Settled(request.clone()));
                }
            }
            let _ = tx.send(Some(request));
        });
    }
}
