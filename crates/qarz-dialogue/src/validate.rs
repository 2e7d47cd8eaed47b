// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Format predicates for typed input.
//!
//! Failures carry the reason shown to the user; the offending value is
//! never retained.

use std::sync::LazyLock;

use qarz_core::MAX_AMOUNT;
use regex::Regex;

/// Base-10 digits only: no sign, separators, or exponent.
static AMOUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

/// Why a typed value was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalid {
    /// Not a base-10 integer string.
    Amount,
    /// Above the ledger's per-entry ceiling.
    TooLarge,
    /// An amount of zero where a positive one is required.
    ZeroAmount,
    /// Blank text.
    Empty,
}

/// A non-negative integer amount, e.g. an opening balance. Separators and
/// signs are refused: `"10000"` is accepted, `"-5"` and `"10,000"` are not.
pub fn non_negative_amount(input: &str) -> Result<i64, Invalid> {
    let input = input.trim();
    if !AMOUNT.is_match(input) {
        return Err(Invalid::Amount);
    }
    // Digits only, so a parse failure can only be overflow.
    match input.parse::<i64>() {
        Ok(amount) if amount <= MAX_AMOUNT => Ok(amount),
        _ => Err(Invalid::TooLarge),
    }
}

/// A strictly positive integer amount, for debts and payments.
pub fn positive_amount(input: &str) -> Result<i64, Invalid> {
    match non_negative_amount(input)? {
        0 => Err(Invalid::ZeroAmount),
        amount => Ok(amount),
    }
}

/// Trimmed non-empty free text such as a name or location.
pub fn text(input: &str) -> Result<String, Invalid> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(Invalid::Empty)
    } else {
        Ok(trimmed.to_string())
    }
}
