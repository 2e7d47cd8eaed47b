// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Amount rendering.

/// Render an amount with comma thousands separators and a currency label,
/// e.g. `10,000 so'm`. Negative balances (credits) keep their sign.
pub fn format_amount(amount: i64, currency: &str) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped} {currency}")
}
