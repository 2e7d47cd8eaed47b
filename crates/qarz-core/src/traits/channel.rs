// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for messaging platform integrations.

use async_trait::async_trait;

use crate::error::QarzError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundMessage, MessageId, OutboundMessage};

/// Adapter for bidirectional messaging channel integrations.
///
/// A channel delivers outbound prompts and surfaces inbound events
/// (text, commands, shared contacts, button presses). The dialogue engine
/// never sees transport metadata beyond identity and chat id.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), QarzError>;

    /// Sends a prompt through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, QarzError>;

    /// Receives the next inbound message from the channel.
    async fn receive(&self) -> Result<InboundMessage, QarzError>;
}
