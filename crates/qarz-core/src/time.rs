// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp text written to the ledger and session tables, and its display form.

use chrono::{DateTime, Utc};

/// UTC with millisecond precision, e.g. `2026-03-01T09:30:00.000Z`.
pub const STORED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// The current time in [`STORED_FORMAT`].
pub fn now() -> String {
    Utc::now().format(STORED_FORMAT).to_string()
}

/// Render a stored timestamp to the minute, e.g. `2026-03-01 09:30`.
///
/// Text that does not parse as RFC 3339 is returned unchanged.
pub fn minute_label(stored: &str) -> String {
    match DateTime::parse_from_rfc3339(stored) {
        Ok(at) => at.with_timezone(&Utc).format(MINUTE_FORMAT).to_string(),
        Err(_) => stored.to_string(),
    }
}
