// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `qarz serve` command implementation.
//!
//! Opens the SQLite store, connects the Telegram channel, and runs the
//! dialogue loop until SIGINT or SIGTERM, then drains in-flight events and
//! closes the store.

use std::sync::Arc;
use std::time::Duration;

use qarz_config::QarzConfig;
use qarz_core::{ChannelAdapter, LedgerStore, PluginAdapter, QarzError};
use qarz_dialogue::shutdown;
use qarz_dialogue::{DialogueHandler, DialogueLoop, Sessions};
use qarz_ledger::Ledger;
use qarz_storage::SqliteStore;
use qarz_telegram::TelegramChannel;
use tracing::{info, warn};

/// Workspace crates whose logs follow `bot.log_level`.
const QARZ_TARGETS: &[&str] = &[
    "qarz",
    "qarz_config",
    "qarz_storage",
    "qarz_ledger",
    "qarz_dialogue",
    "qarz_telegram",
];

/// Runs the `qarz serve` command.
pub async fn run_serve(config: QarzConfig) -> Result<(), QarzError> {
    init_tracing(&config.bot.log_level);

    info!(bot = %config.bot.name, "starting qarz serve");

    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await?;

    let timeout = config.ledger.store_timeout();
    let ledger = Ledger::new(store.clone(), timeout);
    let sessions = Sessions::new(store.clone(), timeout);

    let mut telegram = TelegramChannel::new(config.telegram.clone())?;
    telegram.connect().await?;
    let channel: Arc<dyn ChannelAdapter> = Arc::new(telegram);

    let handler = Arc::new(DialogueHandler::from_config(
        &config,
        ledger,
        sessions,
        channel.clone(),
    )?);

    let cancel = shutdown::install_signal_handler();
    let dialogue = DialogueLoop::new(
        channel.clone(),
        handler,
        Duration::from_secs(config.dialogue.drain_timeout_secs),
    );
    let result = dialogue.run(cancel).await;

    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "channel shutdown failed");
    }
    store.close().await?;

    info!("qarz serve stopped");
    result
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

/// `warn` for dependencies, `log_level` for the workspace crates.
fn default_directives(log_level: &str) -> String {
    QARZ_TARGETS
        .iter()
        .fold("warn".to_string(), |acc, target| {
            format!("{acc},{target}={log_level}")
        })
}
