//! Background janitor and reconciler loops.
//!
//! Structurally identical to the teacher's `run_simulation_loop` /
//! `run_poll_loop`: a `tokio::time::interval` ticker driving one async
//! loop per concern, each independently cancelable.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::session::SessionManager;

/// Evict sessions idle past `retention` on every `tick`, until `cancel`
/// fires.
pub async fn run_cleanup_loop(
    manager: Arc<SessionManager>,
    tick: Duration,
    retention: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval(tick);
    tracing::info!("cleanup loop started (tick={:?}, retention={:?})", tick, retention);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evicted = manager.cleanup(retention).await;
                if evicted > 0 {
                    tracing::info!("cleanup evicted {evicted} idle session(s)");
                }
            }
            _ = cancel.cancelled() => {
                tracing::info!("cleanup loop stopping");
                break;
            }
        }
    }
}

/// Prune in-memory sessions whose persistence file disappeared, on
/// every `tick`, until `cancel` fires. The short default tick (spec §9)
/// is what makes "delete the file to evict the session" a responsive
/// operator workflow.
pub async fn run_reconcile_loop(manager: Arc<SessionManager>, tick: Duration, cancel: CancellationToken) {
    let mut ticker = interval(tick);
    tracing::info!("reconcile loop started (tick={:?})", tick);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let pruned = manager.reconcile().await;
                if pruned > 0 {
                    tracing::info!("reconcile pruned {pruned} session(s) with missing files");
                }
            }
            _ = cancel.cancelled() => {
                tracing::info!("reconcile loop stopping");
                break;
            }
        }
    }
}
