//! services/client/src/views/progress_task.rs
//!
//! This module contains the asynchronous "worker" that animates upload progress
//! while the backend processes a document.

use crate::config::ProgressSettings;
use crate::views::intake::IntakeInner;
use parking_lot::Mutex;
use std::sync::Weak;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Owns the running progress task. Dropping it stops the task, so the task
/// lives exactly as long as the `Uploading` state that holds it.
#[derive(Debug)]
pub struct ProgressTicker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    pub(crate) fn spawn(target: Weak<Mutex<IntakeInner>>, attempt: u64, settings: ProgressSettings) -> Self {
        let token = CancellationToken::new();
        let handle = tokio::spawn(progress_process(target, attempt, settings, token.clone()));
        Self { token, handle }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.token.cancel();
        self.handle.abort();
    }
}

/// Bumps the session's progress by one step per tick until the cap is reached,
/// the session leaves `Uploading`, or the token is cancelled.
async fn progress_process(
    target: Weak<Mutex<IntakeInner>>,
    attempt: u64,
    settings: ProgressSettings,
    cancellation_token: CancellationToken,
) {
    debug!("Progress simulation started for upload attempt {}.", attempt);
    let mut ticks = interval_at(Instant::now() + settings.tick, settings.tick);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                debug!("Progress simulation cancelled for upload attempt {}.", attempt);
                return;
            }
            _ = ticks.tick() => {}
        }

        let Some(session) = target.upgrade() else {
            return;
        };
        let keep_going = session.lock().advance_progress(attempt, &settings);
        if !keep_going {
            debug!("Progress simulation for upload attempt {} has nothing left to do.", attempt);
            return;
        }
    }
}
