// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialogue states.
//!
//! Each variant carries exactly the fields its transitions read, so a state
//! can never consult a value an earlier turn did not collect. The whole enum
//! is the persisted session document.

use qarz_core::types::{DebtorId, Phone, ShopId};
use serde::{Deserialize, Serialize};
use strum::{EnumDiscriminants, EnumIter, IntoStaticStr};

/// The signed-in shop a shop-side state acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSession {
    pub id: ShopId,
    pub name: String,
}

/// Where the user entered `DebtorDetail` from; "back" returns there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Search,
    List,
    Menu,
}

/// A fully collected new debtor awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtorDraft {
    pub name: String,
    pub nickname: String,
    pub phone: Phone,
    pub amount: i64,
}

/// Where a session is in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, IntoStaticStr, EnumDiscriminants)]
#[serde(tag = "state", rename_all = "snake_case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[strum_discriminants(name(StateKind), derive(EnumIter, Hash))]
pub enum DialogueState {
    #[default]
    Initial,
    AwaitRoleChoice,
    AwaitDebtorContact,
    AwaitShopContact,
    AwaitShopName {
        phone: Phone,
    },
    AwaitShopLocation {
        phone: Phone,
        name: String,
    },
    ShopMenu {
        shop: ShopSession,
    },
    AwaitSearchPhone {
        shop: ShopSession,
    },
    AwaitNewName {
        shop: ShopSession,
    },
    AwaitNewNickname {
        shop: ShopSession,
        name: String,
    },
    AwaitNewPhone {
        shop: ShopSession,
        name: String,
        nickname: String,
    },
    AwaitExistingChoice {
        shop: ShopSession,
        name: String,
        nickname: String,
        phone: Phone,
        existing: DebtorId,
    },
    AwaitNewAmount {
        shop: ShopSession,
        name: String,
        nickname: String,
        phone: Phone,
    },
    ConfirmNewDebtor {
        shop: ShopSession,
        draft: DebtorDraft,
    },
    ListDebtors {
        shop: ShopSession,
    },
    DebtorDetail {
        shop: ShopSession,
        debtor: DebtorId,
        origin: Origin,
    },
    AwaitDebtAmount {
        shop: ShopSession,
        debtor: DebtorId,
        origin: Origin,
    },
    AwaitPaymentAmount {
        shop: ShopSession,
        debtor: DebtorId,
        origin: Origin,
    },
    DebtorSignedIn {
        phone: Phone,
    },
}

impl DialogueState {
    /// Stable upper-case name used in logs, e.g. `AWAIT_NEW_PHONE`.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn kind(&self) -> StateKind {
        self.into()
    }

    /// The signed-in shop, for states on the shop side of the conversation.
    pub fn shop(&self) -> Option<&ShopSession> {
        match self {
            DialogueState::ShopMenu { shop }
            | DialogueState::AwaitSearchPhone { shop }
            | DialogueState::AwaitNewName { shop }
            | DialogueState::AwaitNewNickname { shop, .. }
            | DialogueState::AwaitNewPhone { shop, .. }
            | DialogueState::AwaitExistingChoice { shop, .. }
            | DialogueState::AwaitNewAmount { shop, .. }
            | DialogueState::ConfirmNewDebtor { shop, .. }
            | DialogueState::ListDebtors { shop }
            | DialogueState::DebtorDetail { shop, .. }
            | DialogueState::AwaitDebtAmount { shop, .. }
            | DialogueState::AwaitPaymentAmount { shop, .. } => Some(shop),
            DialogueState::Initial
            | DialogueState::AwaitRoleChoice
            | DialogueState::AwaitDebtorContact
            | DialogueState::AwaitShopContact
            | DialogueState::AwaitShopName { .. }
            | DialogueState::AwaitShopLocation { .. }
            | DialogueState::DebtorSignedIn { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> ShopSession {
        ShopSession {
            id: ShopId("s1".into()),
            name: "Baraka".into(),
        }
    }

    #[test]
    fn names_are_screaming_snake_case() {
        assert_eq!(DialogueState::Initial.name(), "INITIAL");
        assert_eq!(
            DialogueState::AwaitNewPhone {
                shop: shop(),
                name: "Ali".into(),
                nickname: "A".into()
            }
            .name(),
            "AWAIT_NEW_PHONE"
        );
    }

    #[test]
    fn persisted_document_is_tagged() {
        let state = DialogueState::DebtorDetail {
            shop: shop(),
            debtor: DebtorId("d1".into()),
            origin: Origin::List,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "debtor_detail");
        assert_eq!(json["origin"], "list");

        let back: DialogueState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn shop_side_states_expose_their_shop() {
        assert!(DialogueState::ShopMenu { shop: shop() }.shop().is_some());
        assert!(DialogueState::AwaitRoleChoice.shop().is_none());
        assert!(
            DialogueState::DebtorSignedIn {
                phone: Phone::from_canonical("+998901111111".into())
            }
            .shop()
            .is_none()
        );
    }
}
