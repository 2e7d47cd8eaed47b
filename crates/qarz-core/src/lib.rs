// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Qarz debt ledger bot.
//!
//! This crate provides the trait definitions, error type, and domain types
//! shared by the storage, ledger, dialogue, and channel crates.

pub mod error;
pub mod time;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::QarzError;
pub use types::{
    AdapterType, Debtor, DebtorId, HealthStatus, MAX_AMOUNT, MessageId, Phone, PhoneFormat, Shop,
    ShopId, Transaction, TransactionKind,
};

pub use traits::{ChannelAdapter, LedgerStore, PluginAdapter, SessionStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qarz_error_variants_display() {
        let storage = QarzError::Storage {
            source: Box::new(std::io::Error::other("disk gone")),
        };
        assert_eq!(storage.to_string(), "storage error: disk gone");

        let dup = QarzError::DuplicatePhoneInShop {
            phone: "+998900000001".into(),
            existing: "d1".into(),
        };
        assert!(dup.to_string().contains("+998900000001"));

        let missing = QarzError::debtor_not_found("d9");
        assert_eq!(missing.to_string(), "debtor not found: d9");
    }

    #[test]
    fn transient_classification() {
        assert!(
            QarzError::Timeout {
                duration: std::time::Duration::from_secs(5)
            }
            .is_transient()
        );
        assert!(
            QarzError::Storage {
                source: "down".into()
            }
            .is_transient()
        );
        assert!(!QarzError::Validation("bad".into()).is_transient());
        assert!(!QarzError::shop_not_found("+998").is_transient());
    }

    #[test]
    fn adapter_type_roundtrip() {
        use std::str::FromStr;
        for variant in [AdapterType::Channel, AdapterType::Storage] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_ledger_store<T: LedgerStore>() {}
        fn _assert_session_store<T: SessionStore>() {}
    }
}
