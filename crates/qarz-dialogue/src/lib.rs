// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialogue engine and dispatch loop for the Qarz debt ledger bot.
//!
//! The [`DialogueLoop`] is the central coordinator that:
//! - Receives events from a channel adapter
//! - Serializes them per identity, running distinct identities concurrently
//! - Hands each event to the [`DialogueHandler`]
//! - Drains in-flight events on shutdown

pub mod effects;
pub mod engine;
pub mod handler;
pub mod prompts;
pub mod session;
pub mod shutdown;
pub mod state;
pub mod validate;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use qarz_core::types::InboundMessage;
use qarz_core::{ChannelAdapter, QarzError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

pub use engine::Engine;
pub use handler::DialogueHandler;
pub use session::Sessions;
pub use state::DialogueState;

/// Receives events from a channel and dispatches them to the handler.
///
/// At most one event per identity is in flight. Later events for a busy
/// identity wait in that identity's queue, in arrival order.
pub struct DialogueLoop {
    channel: Arc<dyn ChannelAdapter>,
    handler: Arc<DialogueHandler>,
    drain_timeout: Duration,
}

impl DialogueLoop {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        handler: Arc<DialogueHandler>,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            channel,
            handler,
            drain_timeout,
        }
    }

    /// Runs until `cancel` fires or the channel closes, then drains.
    ///
    /// After the channel closes, events already queued are still handled.
    /// On cancellation they are discarded.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), QarzError> {
        info!("dialogue loop started");

        let tracker = TaskTracker::new();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<String>();
        // Presence of a key means an event for that identity is in flight.
        let mut busy: HashMap<String, VecDeque<InboundMessage>> = HashMap::new();
        let mut open = true;

        loop {
            if !open && busy.is_empty() {
                break;
            }
            tokio::select! {
                Some(identity) = done_rx.recv() => {
                    match busy.get_mut(&identity).and_then(VecDeque::pop_front) {
                        Some(next) => self.dispatch(&tracker, next, &done_tx),
                        None => {
                            busy.remove(&identity);
                        }
                    }
                }
                msg = self.channel.receive(), if open => {
                    match msg {
                        Ok(inbound) => {
                            if let Some(queue) = busy.get_mut(&inbound.identity) {
                                debug!(identity = %inbound.identity, queued = queue.len() + 1, "identity busy, queueing event");
                                queue.push_back(inbound);
                            } else {
                                busy.insert(inbound.identity.clone(), VecDeque::new());
                                self.dispatch(&tracker, inbound, &done_tx);
                            }
                        }
                        Err(e) if e.to_string().contains("closed") => {
                            info!("channel closed, finishing queued events");
                            open = false;
                        }
                        Err(e) => {
                            error!(error = %e, "error receiving message");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping dialogue loop");
                    break;
                }
            }
        }

        let dropped: usize = busy.values().map(VecDeque::len).sum();
        if dropped > 0 {
            warn!(dropped, "discarding queued events on shutdown");
        }
        shutdown::drain(&tracker, self.drain_timeout).await;

        info!("dialogue loop stopped");
        Ok(())
    }

    fn dispatch(
        &self,
        tracker: &TaskTracker,
        msg: InboundMessage,
        done: &mpsc::UnboundedSender<String>,
    ) {
        let handler = Arc::clone(&self.handler);
        let release = Release {
            identity: msg.identity.clone(),
            done: done.clone(),
        };
        tracker.spawn(async move {
            let _release = release;
            if let Err(e) = handler.handle(msg).await {
                error!(error = %e, "failed to deliver reply");
            }
        });
    }
}

/// Frees an identity's slot when its event finishes, even on panic.
struct Release {
    identity: String,
    done: mpsc::UnboundedSender<String>,
}

impl Drop for Release {
    fn drop(&mut self) {
        let _ = self.done.send(std::mem::take(&mut self.identity));
    }
}
