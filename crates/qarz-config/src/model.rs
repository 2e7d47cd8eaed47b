// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Qarz ledger bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use qarz_core::{PhoneFormat, QarzError};
use serde::{Deserialize, Serialize};

/// Top-level Qarz configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QarzConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Phone format, currency, and store call limits.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Dialogue engine limits.
    #[serde(default)]
    pub dialogue: DialogueConfig,
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in the welcome prompt and logs.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "Qarz Daftar".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables Telegram integration.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Telegram user IDs or usernames allowed to talk to the bot.
    /// Empty means everyone: shops and debtors sign themselves up.
    #[serde(default)]
    pub allowed_users: Vec<String>,

    /// Ignore group and channel messages.
    #[serde(default = "default_true")]
    pub private_only: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            allowed_users: Vec::new(),
            private_only: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("qarz").join("qarz.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("qarz.db"))
        .display()
        .to_string()
}

/// Ledger configuration: accepted phone format, display currency, and the
/// bound on every store call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Country prefix every typed phone number must start with.
    #[serde(default = "default_phone_prefix")]
    pub phone_prefix: String,

    /// Number of digits after the prefix.
    #[serde(default = "default_phone_digits")]
    pub phone_digits: usize,

    /// Currency label appended to rendered amounts.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Upper bound for a single store call, in milliseconds.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            phone_prefix: default_phone_prefix(),
            phone_digits: default_phone_digits(),
            currency: default_currency(),
            store_timeout_ms: default_store_timeout_ms(),
        }
    }
}

impl LedgerConfig {
    /// Compile the configured phone format.
    pub fn phone_format(&self) -> Result<PhoneFormat, QarzError> {
        PhoneFormat::new(&self.phone_prefix, self.phone_digits)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn default_phone_prefix() -> String {
    "+998".to_string()
}

fn default_phone_digits() -> usize {
    9
}

fn default_currency() -> String {
    "so'm".to_string()
}

fn default_store_timeout_ms() -> u64 {
    5000
}

/// Dialogue engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DialogueConfig {
    /// Maximum number of ledger effects one inbound event may chain.
    #[serde(default = "default_max_effect_chain")]
    pub max_effect_chain: usize,

    /// Seconds to wait for in-flight events on shutdown.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            max_effect_chain: default_max_effect_chain(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

fn default_max_effect_chain() -> usize {
    4
}

fn default_drain_timeout_secs() -> u64 {
    10
}
