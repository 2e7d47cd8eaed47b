// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end dialogue testing.
//!
//! `TestHarness` assembles the full stack (temp SQLite database, ledger,
//! sessions, dialogue handler) around a [`MockChannel`]. Its `send_*`
//! helpers drive one event through the handler and return the prompt the
//! user would see.

use std::sync::Arc;
use std::time::Duration;

use qarz_config::model::{QarzConfig, StorageConfig};
use qarz_core::types::{InboundEvent, Prompt};
use qarz_core::{ChannelAdapter, LedgerStore, QarzError};
use qarz_dialogue::{DialogueHandler, DialogueState, Sessions};
use qarz_ledger::Ledger;
use qarz_storage::SqliteStore;

use crate::flaky_store::FlakyStore;
use crate::mock_channel::{MockChannel, inbound};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: QarzConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = QarzConfig::default();
        config.ledger.store_timeout_ms = 2000;
        Self { config }
    }

    /// Accept phone numbers with this prefix and digit count.
    pub fn with_phone_format(mut self, prefix: &str, digits: usize) -> Self {
        self.config.ledger.phone_prefix = prefix.to_string();
        self.config.ledger.phone_digits = digits;
        self
    }

    /// Bound every store call by `timeout`.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.config.ledger.store_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, QarzError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| QarzError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };

        let store = Arc::new(FlakyStore::new(SqliteStore::new(config.storage.clone())));
        store.initialize().await?;

        let timeout = config.ledger.store_timeout();
        let ledger = Ledger::new(store.clone(), timeout);
        let sessions = Sessions::new(store.clone(), timeout);
        let channel = Arc::new(MockChannel::new());
        let handler = Arc::new(DialogueHandler::from_config(
            &config,
            ledger.clone(),
            sessions.clone(),
            channel.clone() as Arc<dyn ChannelAdapter>,
        )?);

        Ok(TestHarness {
            channel,
            store,
            ledger,
            sessions,
            handler,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock channel and temp storage.
pub struct TestHarness {
    /// The mock channel adapter; every reply lands here.
    pub channel: Arc<MockChannel>,
    /// The store behind both the ledger and the sessions.
    pub store: Arc<FlakyStore>,
    pub ledger: Ledger,
    pub sessions: Sessions,
    pub handler: Arc<DialogueHandler>,
    pub config: QarzConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Drive one event from `identity` and return the prompt sent back.
    pub async fn send(&self, identity: &str, event: InboundEvent) -> Result<Prompt, QarzError> {
        self.handler.handle(inbound(identity, event)).await?;
        self.channel
            .sent_to(identity)
            .await
            .pop()
            .map(|m| m.prompt)
            .ok_or_else(|| QarzError::Internal(format!("no reply sent to {identity}")))
    }

    pub async fn send_text(&self, identity: &str, text: &str) -> Result<Prompt, QarzError> {
        self.send(identity, InboundEvent::Text(text.to_string())).await
    }

    pub async fn send_command(&self, identity: &str, command: &str) -> Result<Prompt, QarzError> {
        self.send(identity, InboundEvent::Command(command.to_string()))
            .await
    }

    pub async fn press(&self, identity: &str, token: &str) -> Result<Prompt, QarzError> {
        self.send(identity, InboundEvent::ButtonPress(token.to_string()))
            .await
    }

    /// Share `identity`'s own contact card.
    pub async fn share_contact(&self, identity: &str, phone: &str) -> Result<Prompt, QarzError> {
        self.send(
            identity,
            InboundEvent::Contact {
                phone: phone.to_string(),
                owner_identity: Some(identity.to_string()),
            },
        )
        .await
    }

    /// The persisted dialogue state for `identity`.
    pub async fn state(&self, identity: &str) -> Result<DialogueState, QarzError> {
        self.sessions.get(identity).await
    }

    /// Register a shop through the dialogue and leave `identity` at its menu.
    pub async fn register_shop(
        &self,
        identity: &str,
        phone: &str,
        name: &str,
        location: &str,
    ) -> Result<Prompt, QarzError> {
        self.send_command(identity, "start").await?;
        self.send_text(identity, "🛒 Shop").await?;
        self.share_contact(identity, phone).await?;
        self.send_text(identity, name).await?;
        self.send_text(identity, location).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert_eq!(harness.state("1").await.unwrap(), DialogueState::Initial);
        assert_eq!(harness.channel.sent_count().await, 0);
    }

    #[tokio::test]
    async fn register_shop_lands_on_menu() {
        let harness = TestHarness::builder().build().await.unwrap();
        let prompt = harness
            .register_shop("1", "+998901234567", "Baraka", "Chilonzor")
            .await
            .unwrap();
        assert!(prompt.text.contains("Baraka"));
        assert!(matches!(
            harness.state("1").await.unwrap(),
            DialogueState::ShopMenu { .. }
        ));
    }

    #[tokio::test]
    async fn temp_db_is_unique_per_harness() {
        let h1 = TestHarness::builder().build().await.unwrap();
        let h2 = TestHarness::builder().build().await.unwrap();
        h1.register_shop("1", "+998901234567", "Baraka", "Chilonzor")
            .await
            .unwrap();

        let phone = qarz_core::Phone::from_canonical("+998901234567".into());
        assert!(h1.ledger.find_shop_by_phone(&phone).await.is_ok());
        assert!(h2.ledger.find_shop_by_phone(&phone).await.is_err());
    }
}
