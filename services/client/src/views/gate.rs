//! services/client/src/views/gate.rs
//!
//! Guards the chat view: without an active document the user is sent back to intake.

use crate::views::state::{Route, SessionContext};
use docchat_core::domain::DocumentId;
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Admit(DocumentId),
    Redirect(Route),
}

pub struct SessionGate {
    context: watch::Receiver<SessionContext>,
    last_seen: Option<DocumentId>,
}

impl SessionGate {
    pub fn new(context: watch::Receiver<SessionContext>) -> Self {
        Self { context, last_seen: None }
    }

    pub fn evaluate(context: &SessionContext) -> GateDecision {
        match context {
            SessionContext::ActiveDocument(id) => GateDecision::Admit(id.clone()),
            SessionContext::NoDocument => GateDecision::Redirect(Route::Intake),
        }
    }

    /// The check for a fresh navigation to the chat view.
    pub fn enter(&mut self) -> GateDecision {
        let context = self.context.borrow_and_update().clone();
        self.last_seen = context.document_id().cloned();
        let decision = Self::evaluate(&context);
        if let GateDecision::Redirect(route) = &decision {
            info!("No active document, redirecting to {:?}.", route);
        }
        decision
    }

    /// Waits until the referenced document changes and checks again.
    /// Returns `None` once the context's owner has gone away.
    pub async fn recheck(&mut self) -> Option<GateDecision> {
        loop {
            self.context.changed().await.ok()?;
            let context = self.context.borrow_and_update().clone();
            if context.document_id() == self.last_seen.as_ref() {
                debug!("Session context republished without a document change.");
                continue;
            }
            self.last_seen = context.document_id().cloned();
            return Some(Self::evaluate(&context));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_document_redirects_to_intake() {
        let (_tx, rx) = watch::channel(SessionContext::NoDocument);
        let mut gate = SessionGate::new(rx);
        assert_eq!(gate.enter(), GateDecision::Redirect(Route::Intake));
    }

    #[test]
    fn an_active_document_is_admitted() {
        let id = DocumentId::new("abc123");
        let (_tx, rx) = watch::channel(SessionContext::ActiveDocument(id.clone()));
        let mut gate = SessionGate::new(rx);
        assert_eq!(gate.enter(), GateDecision::Admit(id));
    }

    #[tokio::test]
    async fn clearing_the_document_triggers_a_redirect() {
        let id = DocumentId::new("abc123");
        let (tx, rx) = watch::channel(SessionContext::ActiveDocument(id.clone()));
        let mut gate = SessionGate::new(rx);
        gate.enter();

        tx.send_replace(SessionContext::ActiveDocument(id));
        tx.send_replace(SessionContext::NoDocument);
        assert_eq!(gate.recheck().await, Some(GateDecision::Redirect(Route::Intake)));

        drop(tx);
        assert_eq!(gate.recheck().await, None);
    }

    #[tokio::test]
    async fn republishing_the_same_document_is_not_a_change() {
        let id = DocumentId::new("abc123");
        let (tx, rx) = watch::channel(SessionContext::ActiveDocument(id.clone()));
        let mut gate = SessionGate::new(rx);
        gate.enter();

        tx.send_replace(SessionContext::ActiveDocument(id));
        let waited = tokio::time::timeout(std::time::Duration::from_millis(20), gate.recheck()).await;
        assert!(waited.is_err());
    }
}
