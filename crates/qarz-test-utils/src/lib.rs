// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Qarz integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock messaging channel with message injection and capture
//! - [`FlakyStore`] - SQLite store whose calls can be made to fail on demand
//! - [`TestHarness`] - Temp database, ledger, and dialogue handler wired together

pub mod flaky_store;
pub mod harness;
pub mod mock_channel;

pub use flaky_store::FlakyStore;
pub use harness::TestHarness;
pub use mock_channel::MockChannel;
