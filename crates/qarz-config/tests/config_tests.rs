// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Qarz configuration system.

use qarz_config::diagnostic::ConfigError;
use qarz_config::{load_and_validate_str, load_config_from_str};

#[test]
fn valid_toml_deserializes_into_qarz_config() {
    let toml = r#"
[bot]
name = "Daftar"
log_level = "debug"

[telegram]
bot_token = "123:ABC"
allowed_users = ["alice"]
private_only = false

[storage]
database_path = "/tmp/qarz-test.db"
wal_mode = false

[ledger]
phone_prefix = "+7"
phone_digits = 10
currency = "rub"
store_timeout_ms = 1500

[dialogue]
max_effect_chain = 3
drain_timeout_secs = 2
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.name, "Daftar");
    assert_eq!(config.bot.log_level, "debug");
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(config.telegram.allowed_users, vec!["alice"]);
    assert!(!config.telegram.private_only);
    assert_eq!(config.storage.database_path, "/tmp/qarz-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.ledger.phone_prefix, "+7");
    assert_eq!(config.ledger.phone_digits, 10);
    assert_eq!(config.ledger.currency, "rub");
    assert_eq!(config.ledger.store_timeout_ms, 1500);
    assert_eq!(config.dialogue.max_effect_chain, 3);
    assert_eq!(config.dialogue.drain_timeout_secs, 2);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.ledger.currency, "so'm");
    assert_eq!(config.ledger.phone_prefix, "+998");
}

#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[ledger]
curency = "sum"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "curency");
            assert_eq!(suggestion.as_deref(), Some("currency"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_produces_invalid_type() {
    let toml = r#"
[ledger]
phone_digits = "nine"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject wrong type");
    assert!(
        matches!(errors[0], ConfigError::InvalidType { .. }),
        "got {:?}",
        errors[0]
    );
}

#[test]
fn semantic_validation_runs_after_parse() {
    let toml = r#"
[ledger]
phone_prefix = "998"
"#;

    let errors = load_and_validate_str(toml).expect_err("prefix without + is invalid");
    assert!(errors[0].to_string().contains("ledger.phone_prefix"));
}
