// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ledger effects requested by transitions and their outcomes.

use qarz_core::QarzError;
use qarz_core::types::{Debtor, DebtorId, NewDebtor, NewShop, Phone, Shop, ShopDebt, ShopId};
use qarz_ledger::Ledger;
use strum::IntoStaticStr;

/// One ledger operation the engine needs before it can finish a transition.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Effect {
    FindShopByPhone(Phone),
    CreateShop(NewShop),
    FindDebtorByPhone { shop_id: ShopId, phone: Phone },
    CreateDebtor(NewDebtor),
    GetDebtor(DebtorId),
    ListDebtors(ShopId),
    RecordDebt { debtor: DebtorId, amount: i64 },
    RecordPayment { debtor: DebtorId, amount: i64 },
    FindDebtsByPhone(Phone),
}

/// What an effect produced, with the recoverable failures folded in.
///
/// Lookup misses, conflicts, and validation refusals are part of the
/// conversation; only transient and internal failures stay errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    ShopFound(Shop),
    ShopCreated(ShopId),
    DebtorFound(DebtorId),
    DebtorCreated(DebtorId),
    Debtor(Debtor),
    Debtors(Vec<Debtor>),
    Debts(Vec<ShopDebt>),
    NotFound,
    /// A phone is taken; `existing` names the debtor already holding it.
    Conflict { existing: Option<DebtorId> },
    Rejected(String),
}

impl Effect {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Whether the effect writes to the ledger.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Effect::CreateShop(_)
                | Effect::CreateDebtor(_)
                | Effect::RecordDebt { .. }
                | Effect::RecordPayment { .. }
        )
    }

    /// Run the effect against the ledger.
    pub async fn execute(self, ledger: &Ledger) -> Result<Outcome, QarzError> {
        let result = match self {
            Effect::FindShopByPhone(phone) => {
                ledger.find_shop_by_phone(&phone).await.map(Outcome::ShopFound)
            }
            Effect::CreateShop(new) => ledger.create_shop(new).await.map(Outcome::ShopCreated),
            Effect::FindDebtorByPhone { shop_id, phone } => ledger
                .find_debtor_by_phone(&shop_id, &phone)
                .await
                .map(Outcome::DebtorFound),
            Effect::CreateDebtor(new) => {
                ledger.create_debtor(new).await.map(Outcome::DebtorCreated)
            }
            Effect::GetDebtor(id) => ledger.get_debtor(&id).await.map(Outcome::Debtor),
            Effect::ListDebtors(shop_id) => {
                ledger.list_debtors(&shop_id).await.map(Outcome::Debtors)
            }
            Effect::RecordDebt { debtor, amount } => {
                ledger.record_debt(&debtor, amount).await.map(Outcome::Debtor)
            }
            Effect::RecordPayment { debtor, amount } => {
                ledger.record_payment(&debtor, amount).await.map(Outcome::Debtor)
            }
            Effect::FindDebtsByPhone(phone) => {
                ledger.find_debts_by_phone(&phone).await.map(Outcome::Debts)
            }
        };

        match result {
            Ok(outcome) => Ok(outcome),
            Err(QarzError::NotFound { .. }) => Ok(Outcome::NotFound),
            Err(QarzError::DuplicatePhone { .. }) => Ok(Outcome::Conflict { existing: None }),
            Err(QarzError::DuplicatePhoneInShop { existing, .. }) => Ok(Outcome::Conflict {
                existing: Some(DebtorId(existing)),
            }),
            Err(QarzError::Validation(reason)) => Ok(Outcome::Rejected(reason)),
            Err(e) => Err(e),
        }
    }
}

impl Outcome {
    /// Whether the outcome reports a refusal rather than a completed call.
    pub fn is_refusal(&self) -> bool {
        matches!(
            self,
            Outcome::NotFound | Outcome::Conflict { .. } | Outcome::Rejected(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_writes_are_mutations() {
        let phone = Phone::from_canonical("+998901234567".into());
        assert!(!Effect::FindShopByPhone(phone.clone()).is_mutation());
        assert!(!Effect::GetDebtor(DebtorId("d1".into())).is_mutation());
        assert!(
            Effect::RecordPayment {
                debtor: DebtorId("d1".into()),
                amount: 5
            }
            .is_mutation()
        );
        assert_eq!(Effect::FindDebtsByPhone(phone).name(), "find_debts_by_phone");
    }

    #[test]
    fn refusals_are_not_completions() {
        assert!(Outcome::Rejected("out of range".into()).is_refusal());
        assert!(Outcome::Conflict { existing: None }.is_refusal());
        assert!(!Outcome::DebtorCreated(DebtorId("d1".into())).is_refusal());
    }
}
