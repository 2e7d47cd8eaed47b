// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Qarz ledger bot.

use thiserror::Error;

/// The primary error type used across all Qarz adapter traits and ledger operations.
#[derive(Debug, Error)]
pub enum QarzError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database unavailable, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, message format, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed user input (phone, amount, empty text).
    #[error("validation error: {0}")]
    Validation(String),

    /// A shop or debtor lookup missed.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Another shop is already registered with this phone number.
    #[error("a shop with phone {phone} already exists")]
    DuplicatePhone { phone: String },

    /// The shop already references a debtor with this phone number.
    #[error("debtor with phone {phone} already exists in this shop")]
    DuplicatePhoneInShop { phone: String, existing: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl QarzError {
    /// Whether the failure means the store could not be reached in time.
    ///
    /// Transient failures must never advance a dialogue; the same inbound
    /// event can be retried once the store recovers.
    pub fn is_transient(&self) -> bool {
        matches!(self, QarzError::Storage { .. } | QarzError::Timeout { .. })
    }

    /// Shorthand for a [`QarzError::NotFound`] on a debtor id.
    pub fn debtor_not_found(id: impl Into<String>) -> Self {
        QarzError::NotFound {
            entity: "debtor",
            key: id.into(),
        }
    }

    /// Shorthand for a [`QarzError::NotFound`] on a shop id or phone.
    pub fn shop_not_found(key: impl Into<String>) -> Self {
        QarzError::NotFound {
            entity: "shop",
            key: key.into(),
        }
    }
}
