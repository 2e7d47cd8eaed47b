// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `qarz debts` command implementation: an operator lookup of what one
//! phone number owes across every shop.

use std::sync::Arc;

use qarz_config::QarzConfig;
use qarz_core::types::ShopDebt;
use qarz_core::{LedgerStore, Phone, QarzError};
use qarz_ledger::{Ledger, format_amount};
use qarz_storage::SqliteStore;

pub async fn run_debts(config: &QarzConfig, raw_phone: &str) -> Result<(), QarzError> {
    let phone = config.ledger.phone_format()?.parse(raw_phone)?;

    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await?;
    let ledger = Ledger::new(store.clone(), config.ledger.store_timeout());
    let debts = ledger.find_debts_by_phone(&phone).await;
    store.close().await?;

    print!("{}", render_debts(&phone, &debts?, &config.ledger.currency));
    Ok(())
}

/// One line per shop, then the total.
pub fn render_debts(phone: &Phone, debts: &[ShopDebt], currency: &str) -> String {
    if debts.is_empty() {
        return format!("{phone}: no debts\n");
    }
    let mut out = format!("{phone}:\n");
    for debt in debts {
        out.push_str(&format!(
            "  {}: {}\n",
            debt.shop_name,
            format_amount(debt.debt_amount, currency)
        ));
    }
    let total: i64 = debts.iter().map(|d| d.debt_amount).sum();
    out.push_str(&format!("  total: {}\n", format_amount(total, currency)));
    out
}
