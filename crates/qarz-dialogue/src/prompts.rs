// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing prompt texts, keyboards, and inline buttons.

use qarz_core::{MAX_AMOUNT, time};
use qarz_core::types::{Debtor, InlineButton, Phone, Prompt, ShopDebt, TransactionKind};
use qarz_ledger::format_amount;

use crate::state::DebtorDraft;

pub const ROLE_SHOP: &str = "🛒 Shop";
pub const ROLE_DEBTOR: &str = "👤 Debtor";
pub const SHARE_PHONE: &str = "Share Phone Number 📞";
pub const BACK: &str = "Back 🔙";
pub const MENU_SEARCH: &str = "🔎 Search debtor";
pub const MENU_ADD: &str = "➕ Add debtor";
pub const MENU_LIST: &str = "📃 List of debtors";
pub const MY_DEBTS: &str = "📋 My debts";

/// Tokens carried by inline buttons.
pub mod token {
    pub const DEBT: &str = "+";
    pub const PAYMENT: &str = "-";
    pub const BACK: &str = "back";
    pub const HISTORY: &str = "history";
    pub const CONFIRM: &str = "confirm";
    pub const REJECT: &str = "reject";
    pub const EXISTING: &str = "existing";
    pub const ANOTHER: &str = "another";
}

/// Renders every prompt the engine sends.
#[derive(Debug, Clone)]
pub struct Prompts {
    bot_name: String,
    currency: String,
    phone_example: String,
}

impl Prompts {
    pub fn new(
        bot_name: impl Into<String>,
        currency: impl Into<String>,
        phone_example: impl Into<String>,
    ) -> Self {
        Self {
            bot_name: bot_name.into(),
            currency: currency.into(),
            phone_example: phone_example.into(),
        }
    }

    fn amount(&self, amount: i64) -> String {
        format_amount(amount, &self.currency)
    }

    pub fn welcome(&self) -> Prompt {
        Prompt::text(format!(
            "Welcome to the \"{}\" bot. Please choose your role. ⤵",
            self.bot_name
        ))
        .with_keyboard(vec![vec![ROLE_SHOP.into(), ROLE_DEBTOR.into()]])
    }

    pub fn cancelled(&self) -> Prompt {
        Prompt::text("Cancelled. Send /start to begin again.")
    }

    pub fn debtor_contact(&self) -> Prompt {
        Prompt::text("Please share your phone number to sign in as a debtor. ⤵")
            .with_contact_request(vec![vec![SHARE_PHONE.into()], vec![BACK.into()]])
    }

    pub fn shop_contact(&self) -> Prompt {
        Prompt::text("Please share your phone number to sign in as a shop. ⤵")
            .with_contact_request(vec![vec![SHARE_PHONE.into()], vec![BACK.into()]])
    }

    pub fn shop_name(&self) -> Prompt {
        Prompt::text("No shop is registered with this number yet. Please send your shop's name.")
    }

    pub fn shop_location(&self) -> Prompt {
        Prompt::text("Please send your shop's location.")
    }

    pub fn shop_menu(&self, shop_name: &str) -> Prompt {
        Prompt::text(format!("🛒 {shop_name}\nChoose an action ⤵")).with_keyboard(vec![
            vec![MENU_SEARCH.into()],
            vec![MENU_ADD.into()],
            vec![MENU_LIST.into()],
        ])
    }

    pub fn search_phone(&self) -> Prompt {
        Prompt::text(format!(
            "Please send the debtor's phone number in format '{}'",
            self.phone_example
        ))
    }

    pub fn new_name(&self) -> Prompt {
        Prompt::text("Please send new debtor's name")
    }

    pub fn new_nickname(&self) -> Prompt {
        Prompt::text("Please send new debtor's nickname")
    }

    pub fn new_phone(&self) -> Prompt {
        Prompt::text(format!(
            "Please send new debtor's phone number in format '{}'",
            self.phone_example
        ))
    }

    pub fn existing_choice(&self, phone: &Phone) -> Prompt {
        Prompt::text(format!(
            "A debtor with phone {phone} already exists in your shop."
        ))
        .with_inline(vec![
            vec![InlineButton::new("👁 Go to existing", token::EXISTING)],
            vec![InlineButton::new("📞 Enter another phone", token::ANOTHER)],
        ])
    }

    pub fn new_amount(&self) -> Prompt {
        Prompt::text("Please send the debtor's current debt amount (0 if none)")
    }

    pub fn confirm(&self, draft: &DebtorDraft) -> Prompt {
        Prompt::text(format!(
            "Please confirm the new debtor:\nname: {}\nnickname: {}\nphone: {}\ndebt: {}",
            draft.name,
            draft.nickname,
            draft.phone,
            self.amount(draft.amount)
        ))
        .with_inline(vec![vec![
            InlineButton::new("✅ Save", token::CONFIRM),
            InlineButton::new("✏️ Start over", token::REJECT),
        ]])
    }

    fn card_text(&self, debtor: &Debtor) -> String {
        let balance = if debtor.debt_amount < 0 {
            format!("credit: {}", self.amount(debtor.debt_amount.saturating_neg()))
        } else {
            format!("debt: {}", self.amount(debtor.debt_amount))
        };
        format!(
            "phone: {}\nname: {}\nnickname: {}\n{balance}",
            debtor.phone, debtor.name, debtor.nickname
        )
    }

    fn card_buttons() -> Vec<Vec<InlineButton>> {
        vec![
            vec![
                InlineButton::new("➕", token::DEBT),
                InlineButton::new("➖", token::PAYMENT),
            ],
            vec![InlineButton::new("📜 History", token::HISTORY)],
            vec![InlineButton::new("🔙", token::BACK)],
        ]
    }

    /// The debtor card: contact details, balance, and the action buttons.
    pub fn debtor_card(&self, debtor: &Debtor) -> Prompt {
        Prompt::text(self.card_text(debtor)).with_inline(Self::card_buttons())
    }

    /// The debtor card followed by the transaction log, oldest first.
    pub fn debtor_history(&self, debtor: &Debtor) -> Prompt {
        let mut text = self.card_text(debtor);
        text.push_str("\n\nHistory:");
        if debtor.transactions.is_empty() {
            text.push_str("\nNo transactions yet.");
        }
        for tx in &debtor.transactions {
            let sign = match tx.kind {
                TransactionKind::Debt => "➕",
                TransactionKind::Payment => "➖",
            };
            let when = time::minute_label(&tx.created_at);
            text.push_str(&format!("\n{when} {sign} {}", self.amount(tx.amount)));
        }
        Prompt::text(text).with_inline(Self::card_buttons())
    }

    /// One button per debtor, labelled with the balance, plus a back button.
    pub fn debtor_list(&self, debtors: &[Debtor]) -> Prompt {
        let text = if debtors.is_empty() {
            "You have no debtors yet.".to_string()
        } else {
            format!("📃 Debtors ({})", debtors.len())
        };
        let mut rows: Vec<Vec<InlineButton>> = debtors
            .iter()
            .map(|d| {
                vec![InlineButton::new(
                    format!("{} - {}", d.name, self.amount(d.debt_amount)),
                    d.id.0.clone(),
                )]
            })
            .collect();
        rows.push(vec![InlineButton::new("🔙", token::BACK)]);
        Prompt::text(text).with_inline(rows)
    }

    pub fn debt_amount(&self) -> Prompt {
        Prompt::text("Please send the amount of new debt ⤵")
            .with_inline(vec![vec![InlineButton::new("🔙", token::BACK)]])
    }

    pub fn payment_amount(&self) -> Prompt {
        Prompt::text("Please send the amount of payment ⤵")
            .with_inline(vec![vec![InlineButton::new("🔙", token::BACK)]])
    }

    pub fn signed_in(&self, phone: &Phone) -> Prompt {
        Prompt::text(format!(
            "You are signed in as {phone}. Press \"My debts\" to see what you owe. ⤵"
        ))
        .with_keyboard(vec![vec![MY_DEBTS.into()]])
    }

    pub fn debts(&self, debts: &[ShopDebt]) -> Prompt {
        let text = if debts.is_empty() {
            "You have no debts. 🎉".to_string()
        } else {
            let lines: Vec<String> = debts
                .iter()
                .map(|d| format!("• {}: {}", d.shop_name, self.amount(d.debt_amount)))
                .collect();
            format!("Your debts:\n{}", lines.join("\n"))
        };
        Prompt::text(text).with_keyboard(vec![vec![MY_DEBTS.into()]])
    }

    // --- Notices prefixed to a re-prompt ---

    pub fn invalid_phone(&self) -> String {
        format!(
            "❗ Invalid phone number. Please use the format '{}'.",
            self.phone_example
        )
    }

    pub fn invalid_amount(&self) -> String {
        "❗ The amount must be a whole number, e.g. 10000.".to_string()
    }

    pub fn amount_too_large(&self) -> String {
        format!("❗ The amount must not exceed {}.", self.amount(MAX_AMOUNT))
    }

    pub fn balance_out_of_range(&self) -> String {
        format!(
            "❗ This would take the balance out of range (at most {} either way). Enter a smaller amount.",
            self.amount(MAX_AMOUNT)
        )
    }

    pub fn zero_amount(&self) -> String {
        "❗ The amount must be greater than zero.".to_string()
    }

    pub fn empty_text(&self) -> String {
        "❗ Please send a non-empty text.".to_string()
    }

    pub fn own_contact_required(&self) -> String {
        "❗ Please share your own contact using the button below.".to_string()
    }

    pub fn debtor_not_found(&self) -> String {
        "❗ No debtor with this phone number in your shop.".to_string()
    }

    pub fn debtor_missing(&self) -> String {
        "❗ This debtor could not be found.".to_string()
    }

    pub fn shop_missing(&self) -> String {
        "❗ Your shop could not be found. Please sign in again.".to_string()
    }

    pub fn unexpected(&self) -> String {
        "Please use the options below ⤵".to_string()
    }

    pub fn sign_in_first(&self) -> String {
        "Please sign in as a shop first with /start.".to_string()
    }

    pub fn shop_registered(&self) -> String {
        "✅ Shop registered.".to_string()
    }

    pub fn debtor_saved(&self) -> String {
        "✅ Debtor saved.".to_string()
    }

    pub fn debt_recorded(&self, amount: i64) -> String {
        format!("✅ Debt of {} recorded.", self.amount(amount))
    }

    pub fn payment_recorded(&self, amount: i64) -> String {
        format!("✅ Payment of {} recorded.", self.amount(amount))
    }

    /// Shown when the store is unreachable; the dialogue does not advance.
    pub fn try_later(&self) -> Prompt {
        Prompt::text(
            "⚠️ Something went wrong. Please try again later or contact the administrator.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qarz_core::types::{DebtorId, ShopId, Transaction};

    fn prompts() -> Prompts {
        Prompts::new("Qarz Daftar", "so'm", "+998XXXXXXXXX")
    }

    fn debtor(amount: i64) -> Debtor {
        Debtor {
            id: DebtorId("d1".into()),
            shop_id: ShopId("s1".into()),
            name: "Ali".into(),
            nickname: "Ali aka".into(),
            phone: Phone::from_canonical("+998901234567".into()),
            debt_amount: amount,
            transactions: vec![Transaction {
                kind: TransactionKind::Debt,
                amount: amount.max(1),
                created_at: "2026-03-01T09:30:00.000Z".into(),
            }],
            created_at: "2026-03-01T09:30:00.000Z".into(),
        }
    }

    #[test]
    fn welcome_names_the_bot_and_offers_roles() {
        let prompt = prompts().welcome();
        assert!(prompt.text.contains("\"Qarz Daftar\""));
        let keyboard = prompt.keyboard.unwrap();
        assert_eq!(keyboard.rows, vec![vec![ROLE_SHOP.to_string(), ROLE_DEBTOR.to_string()]]);
        assert!(!keyboard.request_contact);
    }

    #[test]
    fn contact_prompts_request_contact() {
        assert!(prompts().debtor_contact().keyboard.unwrap().request_contact);
        assert!(prompts().shop_contact().keyboard.unwrap().request_contact);
    }

    #[test]
    fn card_shows_grouped_balance() {
        let prompt = prompts().debtor_card(&debtor(10_000));
        assert_eq!(
            prompt.text,
            "phone: +998901234567\nname: Ali\nnickname: Ali aka\ndebt: 10,000 so'm"
        );
        let tokens: Vec<&str> = prompt
            .inline
            .as_ref()
            .unwrap()
            .iter()
            .flatten()
            .map(|b| b.token.as_str())
            .collect();
        assert_eq!(tokens, vec!["+", "-", "history", "back"]);
    }

    #[test]
    fn card_shows_credit_for_negative_balance() {
        let prompt = prompts().debtor_card(&debtor(-500));
        assert!(prompt.text.ends_with("credit: 500 so'm"));
    }

    #[test]
    fn history_lists_transactions() {
        let prompt = prompts().debtor_history(&debtor(5_000));
        assert!(prompt.text.contains("History:\n2026-03-01 09:30 ➕ 5,000 so'm"));
    }

    #[test]
    fn list_buttons_carry_debtor_ids() {
        let prompt = prompts().debtor_list(&[debtor(1_500)]);
        let rows = prompt.inline.unwrap();
        assert_eq!(rows[0][0].label, "Ali - 1,500 so'm");
        assert_eq!(rows[0][0].token, "d1");
        assert_eq!(rows.last().unwrap()[0].token, token::BACK);
    }

    #[test]
    fn debts_view_lists_each_shop() {
        let prompt = prompts().debts(&[
            ShopDebt {
                shop_name: "ShopX".into(),
                debt_amount: 1000,
            },
            ShopDebt {
                shop_name: "ShopY".into(),
                debt_amount: 2000,
            },
        ]);
        assert_eq!(
            prompt.text,
            "Your debts:\n• ShopX: 1,000 so'm\n• ShopY: 2,000 so'm"
        );
        assert_eq!(prompts().debts(&[]).text, "You have no debts. 🎉");
    }
}
