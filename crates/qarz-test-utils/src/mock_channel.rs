// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound messages
//! and captured outbound messages for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use qarz_core::types::{
    AdapterType, HealthStatus, InboundEvent, InboundMessage, MessageId, OutboundMessage,
};
use qarz_core::{ChannelAdapter, PluginAdapter, QarzError};
use tokio::sync::{Mutex, Notify};

/// A mock messaging channel for testing.
///
/// Provides two queues:
/// - **inbound**: Messages injected via `inject_message()` are returned by `receive()`
/// - **sent**: Messages passed to `send()` are captured and retrievable via `sent_messages()`
///
/// After [`close`](MockChannel::close), `receive()` drains what is left
/// and then reports the channel as closed.
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundMessage>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    notify: Arc<Notify>,
    sent_notify: Arc<Notify>,
    closed: AtomicBool,
}

impl MockChannel {
    /// Create a new mock channel with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            sent_notify: Arc::new(Notify::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Inject an inbound message into the receive queue.
    pub async fn inject_message(&self, msg: InboundMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// Inject `event` from `identity`, replying into the chat of the same id.
    pub async fn inject(&self, identity: &str, event: InboundEvent) {
        self.inject_message(inbound(identity, event)).await;
    }

    /// Stop accepting messages once the queue is empty.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Messages sent to one chat, in order.
    pub async fn sent_to(&self, chat_id: &str) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    /// Get the count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Wait until at least `count` messages were sent, up to `timeout`.
    pub async fn wait_for_sent(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.sent_notify.notified();
                if self.sent_count().await >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }

    /// Clear all sent messages.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// An inbound message from `identity` in its private chat.
pub fn inbound(identity: &str, event: InboundEvent) -> InboundMessage {
    InboundMessage {
        id: format!("test-{}", uuid::Uuid::new_v4()),
        identity: identity.to_string(),
        chat_id: identity.to_string(),
        event,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, QarzError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), QarzError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), QarzError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, QarzError> {
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        self.sent_notify.notify_waiters();
        Ok(MessageId(id))
    }

    async fn receive(&self) -> Result<InboundMessage, QarzError> {
        loop {
            let notified = self.notify.notified();
            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(msg);
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(QarzError::Channel {
                    message: "mock channel closed".into(),
                    source: None,
                });
            }
            notified.await;
        }
    }
}
