// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::QarzConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &QarzConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.bot.log_level.as_str()) {
        fail(format!(
            "bot.log_level `{}` must be one of {}",
            config.bot.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let prefix = &config.ledger.phone_prefix;
    let prefix_ok = prefix
        .strip_prefix('+')
        .is_some_and(|code| !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()));
    if !prefix_ok {
        fail(format!(
            "ledger.phone_prefix `{prefix}` must be `+` followed by digits"
        ));
    }

    if !(1..=15).contains(&config.ledger.phone_digits) {
        fail(format!(
            "ledger.phone_digits must be between 1 and 15, got {}",
            config.ledger.phone_digits
        ));
    }

    if config.ledger.store_timeout_ms == 0 {
        fail("ledger.store_timeout_ms must be greater than zero".to_string());
    }

    if config.dialogue.max_effect_chain == 0 {
        fail("dialogue.max_effect_chain must be at least 1".to_string());
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        fail("telegram.bot_token must not be empty when set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&QarzConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = QarzConfig::default();
        config.storage.database_path = "  ".into();
        config.ledger.phone_prefix = "998".into();
        config.ledger.phone_digits = 0;
        config.ledger.store_timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = QarzConfig::default();
        config.bot.log_level = "loud".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("bot.log_level"));
    }
}
