pub mod app;
pub mod chat;
pub mod gate;
pub mod intake;
pub mod progress_task;
pub mod state;
pub mod summary;

// Re-export the entry points the binary and integration tests build on.
pub use app::{ChatView, ClientApp, PageOutOfRange};
pub use chat::{ChatThread, SubmitOutcome};
pub use gate::{GateDecision, SessionGate};
pub use intake::{IntakeError, UploadPhase, UploadSession, UploadSnapshot};
pub use state::{ClientState, Route, SessionContext};
pub use summary::SummaryCache;
