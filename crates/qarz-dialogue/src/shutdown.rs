// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the dialogue loop monitors. Events already
//! being handled are drained before the process exits.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Waits up to `timeout` for every task on `tracker` to finish.
///
/// Closes the tracker first, so no new tasks may be spawned on it.
/// Returns `true` if everything finished in time.
pub async fn drain(tracker: &TaskTracker, timeout: Duration) -> bool {
    tracker.close();
    if tracker.is_empty() {
        info!("no in-flight events to drain");
        return true;
    }

    info!(count = tracker.len(), "waiting for in-flight events to complete");
    match tokio::time::timeout(timeout, tracker.wait()).await {
        Ok(()) => {
            info!("all in-flight events drained");
            true
        }
        Err(_) => {
            warn!(
                remaining = tracker.len(),
                "drain timeout reached, some events interrupted"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn install_signal_handler_returns_token() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
    }

    #[tokio::test]
    async fn drain_empty_tracker() {
        let tracker = TaskTracker::new();
        assert!(drain(&tracker, Duration::from_millis(10)).await);
        assert!(tracker.is_closed());
    }

    #[tokio::test]
    async fn drain_waits_for_tasks() {
        let tracker = TaskTracker::new();
        tracker.spawn(tokio::time::sleep(Duration::from_millis(20)));
        assert!(drain(&tracker, Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn drain_gives_up_after_timeout() {
        let tracker = TaskTracker::new();
        let stuck = CancellationToken::new();
        let waiter = stuck.clone();
        tracker.spawn(async move { waiter.cancelled().await });
        assert!(!drain(&tracker, Duration::from_millis(20)).await);
        stuck.cancel();
    }
}
