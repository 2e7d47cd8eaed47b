// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for the Qarz debt ledger bot.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide:
//! long polling for messages and inline button presses, and prompts
//! rendered with reply or inline keyboards.

pub mod handler;
pub mod markup;

use std::sync::Arc;

use async_trait::async_trait;
use qarz_config::model::TelegramConfig;
use qarz_core::types::{AdapterType, HealthStatus, InboundMessage, MessageId, OutboundMessage};
use qarz_core::{ChannelAdapter, PluginAdapter, QarzError};
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Telegram channel adapter implementing [`ChannelAdapter`].
pub struct TelegramChannel {
    bot: Bot,
    config: TelegramConfig,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

/// Filters shared by the message and callback endpoints.
struct Gate {
    allowed_users: Vec<String>,
    private_only: bool,
    tx: mpsc::Sender<InboundMessage>,
}

impl Gate {
    async fn forward(&self, inbound: InboundMessage) {
        if self.tx.send(inbound).await.is_err() {
            warn!("inbound channel closed, dropping update");
        }
    }
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: TelegramConfig) -> Result<Self, QarzError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            QarzError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;

        if token.is_empty() {
            return Err(QarzError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            config,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, QarzError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), QarzError> {
        debug!("Telegram channel shutting down");
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn connect(&mut self) -> Result<(), QarzError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let gate = Arc::new(Gate {
            allowed_users: self.config.allowed_users.clone(),
            private_only: self.config.private_only,
            tx: self.inbound_tx.clone(),
        });

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let messages = {
                let gate = Arc::clone(&gate);
                Update::filter_message().endpoint(move |msg: Message| {
                    let gate = Arc::clone(&gate);
                    async move {
                        if gate.private_only && !handler::is_dm(&msg) {
                            debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                            return respond(());
                        }
                        if !handler::is_authorized(msg.from.as_ref(), &gate.allowed_users) {
                            debug!(chat_id = msg.chat.id.0, "ignoring unauthorized user");
                            return respond(());
                        }
                        match handler::extract_event(&msg)
                            .and_then(|event| handler::to_inbound_message(&msg, event))
                        {
                            Some(inbound) => gate.forward(inbound).await,
                            None => debug!(msg_id = msg.id.0, "ignoring unsupported message type"),
                        }
                        respond(())
                    }
                })
            };

            let callbacks = Update::filter_callback_query().endpoint(
                move |bot: Bot, query: CallbackQuery| {
                    let gate = Arc::clone(&gate);
                    async move {
                        // Clears the button's loading spinner.
                        if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
                            debug!(error = %e, "failed to answer callback query");
                        }
                        if gate.private_only && !handler::callback_is_dm(&query) {
                            return respond(());
                        }
                        if !handler::is_authorized(Some(&query.from), &gate.allowed_users) {
                            debug!(user_id = query.from.id.0, "ignoring unauthorized button press");
                            return respond(());
                        }
                        if let Some(inbound) = handler::callback_to_inbound(&query) {
                            gate.forward(inbound).await;
                        }
                        respond(())
                    }
                },
            );

            let tree = dptree::entry().branch(messages).branch(callbacks);
            Dispatcher::builder(bot, tree)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, QarzError> {
        let chat_id = parse_chat_id(&msg.chat_id)?;
        let sent = self
            .bot
            .send_message(chat_id, &msg.prompt.text)
            .reply_markup(markup::reply_markup(&msg.prompt))
            .await
            .map_err(|e| QarzError::Channel {
                message: format!("failed to send message: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn receive(&self) -> Result<InboundMessage, QarzError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| QarzError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }
}

fn parse_chat_id(raw: &str) -> Result<ChatId, QarzError> {
    raw.parse::<i64>().map(ChatId).map_err(|e| QarzError::Channel {
        message: format!("invalid chat_id `{raw}`: {e}"),
        source: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(str::to_string),
            ..TelegramConfig::default()
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(TelegramChannel::new(config(None)).is_err());
    }

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramChannel::new(config(Some(""))).is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        assert!(TelegramChannel::new(config(Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11"))).is_ok());
    }

    #[test]
    fn chat_id_parsing() {
        assert_eq!(parse_chat_id("12345").unwrap(), ChatId(12345));
        assert_eq!(parse_chat_id("-100123").unwrap(), ChatId(-100123));
        assert!(parse_chat_id("telegram").is_err());
    }

    #[test]
    fn plugin_adapter_metadata() {
        let channel = TelegramChannel::new(config(Some("test:token"))).unwrap();
        assert_eq!(channel.name(), "telegram");
        assert_eq!(channel.version(), semver::Version::new(0, 1, 0));
        assert_eq!(channel.adapter_type(), AdapterType::Channel);
    }

    #[tokio::test]
    async fn receive_yields_forwarded_updates() {
        let channel = TelegramChannel::new(config(Some("test:token"))).unwrap();
        let inbound = InboundMessage {
            id: "1".into(),
            identity: "42".into(),
            chat_id: "42".into(),
            event: qarz_core::types::InboundEvent::Command("start".into()),
            timestamp: "2026-01-01T00:00:00Z".into(),
        };
        channel.inbound_tx.send(inbound).await.unwrap();
        let received = channel.receive().await.unwrap();
        assert_eq!(received.identity, "42");
        assert_eq!(
            received.event,
            qarz_core::types::InboundEvent::Command("start".into())
        );
    }
}
