// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Qarz ledger.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::QarzError;

/// Unique identifier for a registered shop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShopId(pub String);

/// Unique identifier for a debtor record (one per shop the person owes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DebtorId(pub String);

/// Unique identifier for a delivered outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl ShopId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl DebtorId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ShopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DebtorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A phone number in canonical form: `+` followed by digits only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Phone(String);

impl Phone {
    /// Canonicalize a phone number shared through a contact card.
    ///
    /// Contacts are trusted to be real numbers, so only the shape is
    /// normalized: separators are dropped and a leading `+` is added.
    pub fn from_contact(raw: &str) -> Result<Self, QarzError> {
        let canonical = canonicalize(raw);
        if canonical.len() < 2 || !canonical[1..].chars().all(|c| c.is_ascii_digit()) {
            return Err(QarzError::Validation(format!(
                "shared contact has no usable phone number: {raw:?}"
            )));
        }
        Ok(Self(canonical))
    }

    /// Wrap a value already stored in canonical form.
    pub fn from_canonical(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip separators and force a leading `+`.
fn canonicalize(raw: &str) -> String {
    let digits: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '+'))
        .collect();
    format!("+{digits}")
}

/// The accepted format for typed phone numbers: a fixed country prefix
/// followed by a fixed number of digits.
#[derive(Debug, Clone)]
pub struct PhoneFormat {
    prefix: String,
    digits: usize,
    pattern: Regex,
}

impl PhoneFormat {
    /// Build a format from a `+`-prefixed country code and a digit count.
    pub fn new(prefix: &str, digits: usize) -> Result<Self, QarzError> {
        let pattern = Regex::new(&format!(r"^{}\d{{{digits}}}$", regex::escape(prefix)))
            .map_err(|e| QarzError::Config(format!("invalid phone format: {e}")))?;
        Ok(Self {
            prefix: prefix.to_string(),
            digits,
            pattern,
        })
    }

    /// Parse typed input into a canonical [`Phone`].
    ///
    /// Spaces, dashes and parentheses are ignored and a missing `+` is
    /// supplied before the format check.
    pub fn parse(&self, raw: &str) -> Result<Phone, QarzError> {
        let canonical = canonicalize(raw);
        if self.pattern.is_match(&canonical) {
            Ok(Phone(canonical))
        } else {
            Err(QarzError::Validation(format!(
                "phone must look like {}",
                self.example()
            )))
        }
    }

    /// Template shown to users, e.g. `+998XXXXXXXXX`.
    pub fn example(&self) -> String {
        format!("{}{}", self.prefix, "X".repeat(self.digits))
    }
}

/// Direction of a ledger entry. The sign lives here, never in the amount.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Debt,
    Payment,
}

/// Largest amount a single entry may carry, and the bound on a balance in
/// either direction. Keeps balance arithmetic far from `i64` overflow.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// An immutable, timestamped ledger entry against one debtor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    /// Always positive.
    pub amount: i64,
    /// Creation time in [`crate::time::STORED_FORMAT`].
    pub created_at: String,
}

impl Transaction {
    /// The amount with the sign implied by `kind`.
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            TransactionKind::Debt => self.amount,
            TransactionKind::Payment => -self.amount,
        }
    }
}

/// Denormalized index entry on a shop enabling phone lookup without
/// touching the debtor records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtorRef {
    pub debtor_id: DebtorId,
    pub phone: Phone,
}

/// A registered merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub location: String,
    pub phone: Phone,
    /// Insertion-ordered references to this shop's debtors.
    pub debtors: Vec<DebtorRef>,
    pub created_at: String,
}

/// A person owing money to one shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debtor {
    pub id: DebtorId,
    pub shop_id: ShopId,
    pub name: String,
    pub nickname: String,
    pub phone: Phone,
    /// Positive means the debtor owes money; negative is a credit.
    pub debt_amount: i64,
    /// Append-only, oldest first.
    pub transactions: Vec<Transaction>,
    pub created_at: String,
}

impl Debtor {
    /// Balance recomputed from the transaction log.
    pub fn reconciled_balance(&self) -> i64 {
        self.transactions.iter().map(Transaction::signed_amount).sum()
    }

    /// Whether the stored balance matches the transaction log.
    pub fn is_reconciled(&self) -> bool {
        self.debt_amount == self.reconciled_balance()
    }
}

/// Input for registering a shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShop {
    pub name: String,
    pub location: String,
    pub phone: Phone,
}

/// Input for enrolling a debtor under a shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDebtor {
    pub shop_id: ShopId,
    pub name: String,
    pub nickname: String,
    pub phone: Phone,
    /// Opening balance; zero means no opening transaction is logged.
    pub initial_amount: i64,
}

/// One row of the debtor-as-customer view: what is owed to which shop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShopDebt {
    pub shop_name: String,
    pub debt_amount: i64,
}

/// Raw persisted dialogue session for one end-user identity.
///
/// The state is an opaque serialized document owned by the dialogue engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub identity: String,
    pub state: String,
    pub updated_at: String,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

// --- Channel types ---

/// An inbound event surfaced by a message channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Free text typed by the user (or a reply-keyboard option).
    Text(String),
    /// A slash command, without the leading `/` or any `@bot` suffix.
    Command(String),
    /// A shared contact card and the identity of the contact's owner, if known.
    Contact {
        phone: String,
        owner_identity: Option<String>,
    },
    /// An inline button press carrying its token.
    ButtonPress(String),
}

/// An inbound message received from a channel adapter.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: String,
    /// End-user identity the session is keyed by.
    pub identity: String,
    /// Where replies for this message go.
    pub chat_id: String,
    pub event: InboundEvent,
    pub timestamp: String,
}

/// An inline button: a visible label and the token sent back on press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub token: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// A reply keyboard of text options, one inner vector per row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<String>>,
    /// Render the first button as a "share my contact" request.
    pub request_contact: bool,
}

/// An outbound prompt to be rendered by a channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Prompt {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub inline: Option<Vec<Vec<InlineButton>>>,
}

impl Prompt {
    /// A plain-text prompt with no keyboard.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Attach a reply keyboard.
    pub fn with_keyboard(mut self, rows: Vec<Vec<String>>) -> Self {
        self.keyboard = Some(Keyboard {
            rows,
            request_contact: false,
        });
        self
    }

    /// Attach a reply keyboard whose first button requests the user's contact.
    pub fn with_contact_request(mut self, rows: Vec<Vec<String>>) -> Self {
        self.keyboard = Some(Keyboard {
            rows,
            request_contact: true,
        });
        self
    }

    /// Attach inline buttons.
    pub fn with_inline(mut self, rows: Vec<Vec<InlineButton>>) -> Self {
        self.inline = Some(rows);
        self
    }

    /// Prefix the prompt text with a notice line.
    pub fn with_notice(mut self, notice: &str) -> Self {
        self.text = format!("{notice}\n\n{}", self.text);
        self
    }
}

/// An outbound message to be sent via a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: String,
    pub prompt: Prompt,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uzbek() -> PhoneFormat {
        PhoneFormat::new("+998", 9).unwrap()
    }

    fn tx(kind: TransactionKind, amount: i64) -> Transaction {
        Transaction {
            kind,
            amount,
            created_at: "2026-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn phone_format_accepts_canonical_number() {
        let format = uzbek();
        let phone = format.parse("+998901234567").unwrap();
        assert_eq!(phone.as_str(), "+998901234567");
    }

    #[test]
    fn phone_format_canonicalizes_separators_and_missing_plus() {
        let format = uzbek();
        assert_eq!(
            format.parse("998 90 123-45-67").unwrap().as_str(),
            "+998901234567"
        );
    }

    #[test]
    fn phone_format_rejects_wrong_prefix_and_length() {
        let format = uzbek();
        assert!(format.parse("+79001234567").is_err());
        assert!(format.parse("+99890123456").is_err());
        assert!(format.parse("+9989012345678").is_err());
        assert!(format.parse("hello").is_err());
        assert!(format.parse("").is_err());
    }

    #[test]
    fn custom_phone_format() {
        let format = PhoneFormat::new("+1", 10).unwrap();
        assert!(format.parse("+12025550123").is_ok());
        assert!(format.parse("+998901234567").is_err());
        assert_eq!(format.example(), "+1XXXXXXXXXX");
    }

    #[test]
    fn contact_phone_gets_plus_prefix() {
        let phone = Phone::from_contact("998901234567").unwrap();
        assert_eq!(phone.as_str(), "+998901234567");
        let phone = Phone::from_contact("+998901234567").unwrap();
        assert_eq!(phone.as_str(), "+998901234567");
        assert!(Phone::from_contact("").is_err());
        assert!(Phone::from_contact("abc").is_err());
    }

    #[test]
    fn transaction_kind_display_roundtrip() {
        use std::str::FromStr;
        assert_eq!(TransactionKind::Debt.to_string(), "debt");
        assert_eq!(
            TransactionKind::from_str("payment").unwrap(),
            TransactionKind::Payment
        );
    }

    #[test]
    fn debtor_reconciliation() {
        let mut debtor = Debtor {
            id: DebtorId("d1".into()),
            shop_id: ShopId("s1".into()),
            name: "Ali".into(),
            nickname: "A".into(),
            phone: Phone::from_canonical("+998901234567".into()),
            debt_amount: 3000,
            transactions: vec![
                tx(TransactionKind::Debt, 5000),
                tx(TransactionKind::Payment, 2000),
            ],
            created_at: "2026-01-01T00:00:00Z".into(),
        };
        assert_eq!(debtor.reconciled_balance(), 3000);
        assert!(debtor.is_reconciled());

        debtor.debt_amount = 5000;
        assert!(!debtor.is_reconciled());
    }

    #[test]
    fn prompt_builders() {
        let prompt = Prompt::text("Menu:")
            .with_keyboard(vec![vec!["A".into()]])
            .with_notice("Saved");
        assert_eq!(prompt.text, "Saved\n\nMenu:");
        assert!(!prompt.keyboard.as_ref().unwrap().request_contact);
        assert!(prompt.inline.is_none());
    }
}
