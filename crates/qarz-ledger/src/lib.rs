// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ledger operations for the Qarz debt ledger.
//!
//! [`Ledger`] turns validated inputs into store writes: registering shops,
//! enrolling debtors with their opening balance, and recording debts and
//! payments. Every store call is bounded by a timeout so a stalled backend
//! surfaces as [`qarz_core::QarzError::Timeout`] instead of hanging a dialogue.

pub mod money;
pub mod operations;

pub use money::format_amount;
pub use operations::Ledger;
