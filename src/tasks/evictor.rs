//! Reclaim Loop Task
//!
//! Background task that sleeps until the cache crosses its trigger size, then
//! runs a reclaim pass.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::{Reclaim, ReclaimMode, ReclaimSignal};

// == Evictor Handle ==
/// Owner of a running reclaim loop.
#[derive(Debug)]
pub struct EvictorHandle {
    shutdown: Arc<Notify>,
    join: JoinHandle<()>,
}

impl EvictorHandle {
    /// Stops the loop after any in-flight pass and waits for it to exit.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        if let Err(err) = self.join.await {
            error!(error = %err, "reclaim loop ended abnormally");
        }
    }

    /// Cancels the loop without waiting.
    pub fn abort(&self) {
        self.join.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Spawns the reclaim loop for `target`, woken through `signal`.
///
/// Each pass runs on the blocking pool. A pass that returns an error or
/// panics is logged and the loop goes back to waiting.
///
/// # Example
/// ```ignore
/// let evictor = spawn_evictor(core.clone(), signal.clone());
/// signal.notify();
/// // Later, during shutdown:
/// evictor.shutdown().await;
/// ```
pub fn spawn_evictor<R>(target: Arc<R>, signal: ReclaimSignal) -> EvictorHandle
where
    R: Reclaim + ?Sized + 'static,
{
    let shutdown = Arc::new(Notify::new());
    let stop = shutdown.clone();

    let join = tokio::spawn(async move {
        info!("Starting reclaim loop");

        loop {
            tokio::select! {
                biased;

                _ = stop.notified() => {
                    info!("Reclaim loop stopping");
                    break;
                }

                _ = signal.notified() => {
                    let target = Arc::clone(&target);
                    let outcome = tokio::task::spawn_blocking(move || {
                        target.reclaim(ReclaimMode::Triggered)
                    })
                    .await;

                    match outcome {
                        Ok(Ok(report)) if report.ran => {
                            debug!(
                                evicted = report.evicted_entries,
                                "background reclaim pass finished"
                            );
                        }
                        Ok(Ok(_)) => debug!("woken below trigger size, nothing to reclaim"),
                        Ok(Err(err)) => error!(error = %err, "reclaim pass failed"),
                        Err(err) => error!(error = %err, "reclaim pass panicked"),
                    }
                }
            }
        }
    });

    EvictorHandle { shutdown, join }
}
