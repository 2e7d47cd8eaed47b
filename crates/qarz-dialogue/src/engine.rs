// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dialogue state machine.
//!
//! [`Engine::step`] is a pure decision: given the current state, the sender,
//! and an inbound event it returns either a finished [`Transition`] or an
//! [`Effect`] to run together with a [`Resume`] that finishes the decision
//! once the effect's [`Outcome`] is known. Nothing here touches storage.
//!
//! Transitions are declared per state as an ordered list of [`Rule`]s; the
//! first rule whose guard accepts the event wins. An event no rule accepts
//! re-prompts the current state unchanged.

use qarz_config::model::QarzConfig;
use qarz_core::QarzError;
use qarz_core::types::{
    DebtorId, InboundEvent, NewDebtor, NewShop, Phone, PhoneFormat, Prompt,
};
use tracing::debug;

use crate::effects::{Effect, Outcome};
use crate::prompts::{token, Prompts};
use crate::state::{DebtorDraft, DialogueState, Origin, ShopSession};
use crate::validate::{self, Invalid};

/// A completed decision: the state to persist and the prompt to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: DialogueState,
    pub prompt: Prompt,
}

/// Result of one engine decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Done(Transition),
    /// Run `effect`, then hand its outcome to [`Engine::resume`] with `then`.
    Run { effect: Effect, then: Resume },
}

/// The part of a decision that waits on an effect's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resume {
    ShopLookup {
        phone: Phone,
    },
    ShopCreated {
        phone: Phone,
        name: String,
    },
    SearchLookup {
        shop: ShopSession,
    },
    NewPhoneLookup {
        shop: ShopSession,
        name: String,
        nickname: String,
        phone: Phone,
    },
    DebtorCreated {
        shop: ShopSession,
        draft: DebtorDraft,
    },
    ShowDebtor {
        shop: ShopSession,
        origin: Origin,
        notice: Option<String>,
    },
    /// A debt or payment was written; `retry` is the amount prompt to
    /// return to if the ledger refuses it.
    Recorded {
        retry: DialogueState,
        shop: ShopSession,
        origin: Origin,
        notice: String,
    },
    ShowHistory {
        shop: ShopSession,
        origin: Origin,
    },
    ShowList {
        shop: ShopSession,
        notice: Option<String>,
    },
    ShowDebts {
        phone: Phone,
    },
}

/// Event predicates a rule can be guarded by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guard {
    Any,
    Command(&'static str),
    /// Text or button whose content contains the keyword, ignoring case.
    Choice(&'static str),
    /// A button press with exactly this token.
    Button(&'static str),
    AnyButton,
    AnyText,
    /// A shared contact owned by the sender.
    OwnContact,
    AnyContact,
}

impl Guard {
    fn matches(self, event: &InboundEvent, identity: &str) -> bool {
        match (self, event) {
            (Guard::Any, _) => true,
            (Guard::Command(name), InboundEvent::Command(command)) => {
                command.eq_ignore_ascii_case(name)
            }
            (Guard::Choice(keyword), InboundEvent::Text(text) | InboundEvent::ButtonPress(text)) => {
                text.to_lowercase().contains(keyword)
            }
            (Guard::Button(expected), InboundEvent::ButtonPress(pressed)) => pressed == expected,
            (Guard::AnyButton, InboundEvent::ButtonPress(_)) => true,
            (Guard::AnyText, InboundEvent::Text(_)) => true,
            (
                Guard::OwnContact,
                InboundEvent::Contact {
                    owner_identity: Some(owner),
                    ..
                },
            ) => owner == identity,
            (Guard::AnyContact, InboundEvent::Contact { .. }) => true,
            _ => false,
        }
    }
}

type Apply<'a> = Box<dyn FnOnce(&InboundEvent) -> Step + 'a>;

/// One row of the transition table.
struct Rule<'a> {
    guard: Guard,
    apply: Apply<'a>,
}

fn rule<'a>(guard: Guard, apply: impl FnOnce(&InboundEvent) -> Step + 'a) -> Rule<'a> {
    Rule {
        guard,
        apply: Box::new(apply),
    }
}

/// Payload of a text or button event.
fn payload(event: &InboundEvent) -> &str {
    match event {
        InboundEvent::Text(text) | InboundEvent::ButtonPress(text) => text,
        InboundEvent::Command(name) => name,
        InboundEvent::Contact { phone, .. } => phone,
    }
}

/// The dialogue engine: transition table, validation, and prompt rendering.
#[derive(Debug, Clone)]
pub struct Engine {
    phone_format: PhoneFormat,
    prompts: Prompts,
}

impl Engine {
    pub fn new(phone_format: PhoneFormat, prompts: Prompts) -> Self {
        Self {
            phone_format,
            prompts,
        }
    }

    /// Build the engine from the configured phone format, bot name, and currency.
    pub fn from_config(config: &QarzConfig) -> Result<Self, QarzError> {
        let phone_format = config.ledger.phone_format()?;
        let prompts = Prompts::new(
            &config.bot.name,
            &config.ledger.currency,
            phone_format.example(),
        );
        Ok(Self::new(phone_format, prompts))
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    /// Decide how `state` reacts to `event` from `identity`.
    pub fn step(&self, state: &DialogueState, event: &InboundEvent, identity: &str) -> Step {
        let rules = self.rules(state);
        match rules
            .into_iter()
            .find(|rule| rule.guard.matches(event, identity))
        {
            Some(rule) => (rule.apply)(event),
            None => {
                debug!(state = state.name(), "event not accepted, re-prompting");
                self.enter(state.clone(), Some(self.prompts.unexpected()))
            }
        }
    }

    /// Finish a decision that waited on an effect.
    pub fn resume(&self, then: Resume, outcome: Outcome) -> Result<Step, QarzError> {
        let p = &self.prompts;
        let step = match (then, outcome) {
            (Resume::ShopLookup { .. }, Outcome::ShopFound(shop)) => self.enter(
                DialogueState::ShopMenu {
                    shop: ShopSession {
                        id: shop.id,
                        name: shop.name,
                    },
                },
                None,
            ),
            (Resume::ShopLookup { phone }, Outcome::NotFound) => {
                self.enter(DialogueState::AwaitShopName { phone }, None)
            }

            (Resume::ShopCreated { name, .. }, Outcome::ShopCreated(id)) => self.enter(
                DialogueState::ShopMenu {
                    shop: ShopSession { id, name },
                },
                Some(p.shop_registered()),
            ),
            // Registered concurrently from another session: sign in instead.
            (Resume::ShopCreated { phone, .. }, Outcome::Conflict { .. }) => Step::Run {
                effect: Effect::FindShopByPhone(phone.clone()),
                then: Resume::ShopLookup { phone },
            },
            (Resume::ShopCreated { phone, .. }, Outcome::Rejected(reason)) => self.enter(
                DialogueState::AwaitShopName { phone },
                Some(format!("❗ {reason}")),
            ),

            (Resume::SearchLookup { shop }, Outcome::DebtorFound(id)) => Step::Run {
                effect: Effect::GetDebtor(id),
                then: Resume::ShowDebtor {
                    shop,
                    origin: Origin::Search,
                    notice: None,
                },
            },
            (Resume::SearchLookup { shop }, Outcome::NotFound) => self.enter(
                DialogueState::AwaitSearchPhone { shop },
                Some(p.debtor_not_found()),
            ),

            (
                Resume::NewPhoneLookup {
                    shop,
                    name,
                    nickname,
                    phone,
                },
                Outcome::DebtorFound(existing),
            ) => self.enter(
                DialogueState::AwaitExistingChoice {
                    shop,
                    name,
                    nickname,
                    phone,
                    existing,
                },
                None,
            ),
            (
                Resume::NewPhoneLookup {
                    shop,
                    name,
                    nickname,
                    phone,
                },
                Outcome::NotFound,
            ) => self.enter(
                DialogueState::AwaitNewAmount {
                    shop,
                    name,
                    nickname,
                    phone,
                },
                None,
            ),

            (Resume::DebtorCreated { shop, .. }, Outcome::DebtorCreated(id)) => self.enter(
                DialogueState::DebtorDetail {
                    shop,
                    debtor: id,
                    origin: Origin::Menu,
                },
                Some(p.debtor_saved()),
            ),
            (
                Resume::DebtorCreated { shop, draft },
                Outcome::Conflict {
                    existing: Some(existing),
                },
            ) => self.enter(
                DialogueState::AwaitExistingChoice {
                    shop,
                    name: draft.name,
                    nickname: draft.nickname,
                    phone: draft.phone,
                    existing,
                },
                None,
            ),
            (Resume::DebtorCreated { shop, .. }, Outcome::Rejected(reason)) => self.enter(
                DialogueState::AwaitNewName { shop },
                Some(format!("❗ {reason}")),
            ),
            (Resume::DebtorCreated { .. }, Outcome::NotFound) => {
                self.enter(DialogueState::AwaitRoleChoice, Some(p.shop_missing()))
            }

            (
                Resume::ShowDebtor {
                    shop,
                    origin,
                    notice,
                },
                Outcome::Debtor(debtor),
            ) if debtor.shop_id == shop.id => {
                let mut prompt = p.debtor_card(&debtor);
                if let Some(notice) = notice {
                    prompt = prompt.with_notice(&notice);
                }
                Step::Done(Transition {
                    next: DialogueState::DebtorDetail {
                        shop,
                        debtor: debtor.id,
                        origin,
                    },
                    prompt,
                })
            }
            (
                Resume::Recorded {
                    shop,
                    origin,
                    notice,
                    ..
                },
                outcome @ (Outcome::Debtor(_) | Outcome::NotFound),
            ) => {
                return self.resume(
                    Resume::ShowDebtor {
                        shop,
                        origin,
                        notice: Some(notice),
                    },
                    outcome,
                );
            }
            (Resume::Recorded { retry, .. }, Outcome::Rejected(reason)) => {
                debug!(state = retry.name(), %reason, "amount refused by the ledger");
                self.enter(retry, Some(p.balance_out_of_range()))
            }

            (Resume::ShowHistory { shop, origin }, Outcome::Debtor(debtor))
                if debtor.shop_id == shop.id =>
            {
                Step::Done(Transition {
                    prompt: p.debtor_history(&debtor),
                    next: DialogueState::DebtorDetail {
                        shop,
                        debtor: debtor.id,
                        origin,
                    },
                })
            }
            // A missing debtor, or one belonging to another shop.
            (
                Resume::ShowDebtor { shop, origin, .. } | Resume::ShowHistory { shop, origin },
                Outcome::Debtor(_) | Outcome::NotFound,
            ) => self.enter(origin_state(shop, origin), Some(p.debtor_missing())),

            (Resume::ShowList { shop, notice }, Outcome::Debtors(debtors)) => {
                let mut prompt = p.debtor_list(&debtors);
                if let Some(notice) = notice {
                    prompt = prompt.with_notice(&notice);
                }
                Step::Done(Transition {
                    next: DialogueState::ListDebtors { shop },
                    prompt,
                })
            }

            (Resume::ShowDebts { phone }, Outcome::Debts(debts)) => Step::Done(Transition {
                prompt: p.debts(&debts),
                next: DialogueState::DebtorSignedIn { phone },
            }),

            (then, outcome) => {
                return Err(QarzError::Internal(format!(
                    "unexpected outcome {outcome:?} while resuming {then:?}"
                )));
            }
        };
        Ok(step)
    }

    /// Enter `next`, prefixing its prompt with `notice` if given.
    ///
    /// States whose prompt shows ledger data load it first.
    pub fn enter(&self, next: DialogueState, notice: Option<String>) -> Step {
        let p = &self.prompts;
        let prompt = match &next {
            DialogueState::ListDebtors { shop } => {
                return Step::Run {
                    effect: Effect::ListDebtors(shop.id.clone()),
                    then: Resume::ShowList {
                        shop: shop.clone(),
                        notice,
                    },
                };
            }
            DialogueState::DebtorDetail {
                shop,
                debtor,
                origin,
            } => {
                return Step::Run {
                    effect: Effect::GetDebtor(debtor.clone()),
                    then: Resume::ShowDebtor {
                        shop: shop.clone(),
                        origin: *origin,
                        notice,
                    },
                };
            }
            DialogueState::Initial => p.cancelled(),
            DialogueState::AwaitRoleChoice => p.welcome(),
            DialogueState::AwaitDebtorContact => p.debtor_contact(),
            DialogueState::AwaitShopContact => p.shop_contact(),
            DialogueState::AwaitShopName { .. } => p.shop_name(),
            DialogueState::AwaitShopLocation { .. } => p.shop_location(),
            DialogueState::ShopMenu { shop } => p.shop_menu(&shop.name),
            DialogueState::AwaitSearchPhone { .. } => p.search_phone(),
            DialogueState::AwaitNewName { .. } => p.new_name(),
            DialogueState::AwaitNewNickname { .. } => p.new_nickname(),
            DialogueState::AwaitNewPhone { .. } => p.new_phone(),
            DialogueState::AwaitExistingChoice { phone, .. } => p.existing_choice(phone),
            DialogueState::AwaitNewAmount { .. } => p.new_amount(),
            DialogueState::ConfirmNewDebtor { draft, .. } => p.confirm(draft),
            DialogueState::AwaitDebtAmount { .. } => p.debt_amount(),
            DialogueState::AwaitPaymentAmount { .. } => p.payment_amount(),
            DialogueState::DebtorSignedIn { phone } => p.signed_in(phone),
        };
        let prompt = match notice {
            Some(notice) => prompt.with_notice(&notice),
            None => prompt,
        };
        Step::Done(Transition { next, prompt })
    }

    /// Re-enter `state` after refusing `invalid` input. The input is dropped.
    fn refuse(&self, state: &DialogueState, invalid: Invalid) -> Step {
        let notice = match invalid {
            Invalid::Amount => self.prompts.invalid_amount(),
            Invalid::TooLarge => self.prompts.amount_too_large(),
            Invalid::ZeroAmount => self.prompts.zero_amount(),
            Invalid::Empty => self.prompts.empty_text(),
        };
        debug!(state = state.name(), ?invalid, "input refused");
        self.enter(state.clone(), Some(notice))
    }

    fn refuse_phone(&self, state: &DialogueState) -> Step {
        debug!(state = state.name(), "malformed phone refused");
        self.enter(state.clone(), Some(self.prompts.invalid_phone()))
    }

    /// Commands accepted in every state, checked before the state's own rules.
    fn global_rules<'a>(&'a self, state: &'a DialogueState) -> Vec<Rule<'a>> {
        vec![
            rule(Guard::Command("cancel"), move |_| {
                self.enter(DialogueState::Initial, None)
            }),
            rule(Guard::Command("start"), move |_| {
                self.enter(DialogueState::AwaitRoleChoice, None)
            }),
            rule(Guard::Command("shop_menu"), move |_| match state.shop() {
                Some(shop) => self.enter(DialogueState::ShopMenu { shop: shop.clone() }, None),
                None => self.enter(state.clone(), Some(self.prompts.sign_in_first())),
            }),
        ]
    }

    /// The ordered transition table for `state`.
    fn rules<'a>(&'a self, state: &'a DialogueState) -> Vec<Rule<'a>> {
        use DialogueState as S;

        let mut rules = self.global_rules(state);
        let own: Vec<Rule<'a>> = match state {
            S::Initial => vec![rule(Guard::Any, move |_| self.enter(S::AwaitRoleChoice, None))],

            S::AwaitRoleChoice => vec![
                rule(Guard::Choice("debtor"), move |_| {
                    self.enter(S::AwaitDebtorContact, None)
                }),
                rule(Guard::Choice("shop"), move |_| {
                    self.enter(S::AwaitShopContact, None)
                }),
            ],

            S::AwaitDebtorContact => vec![
                rule(Guard::Choice("back"), move |_| {
                    self.enter(S::AwaitRoleChoice, None)
                }),
                rule(Guard::OwnContact, move |event| {
                    match Phone::from_contact(payload(event)) {
                        Ok(phone) => self.enter(S::DebtorSignedIn { phone }, None),
                        Err(_) => {
                            self.enter(state.clone(), Some(self.prompts.own_contact_required()))
                        }
                    }
                }),
                rule(Guard::AnyContact, move |_| {
                    self.enter(state.clone(), Some(self.prompts.own_contact_required()))
                }),
            ],

            S::AwaitShopContact => vec![
                rule(Guard::Choice("back"), move |_| {
                    self.enter(S::AwaitRoleChoice, None)
                }),
                rule(Guard::OwnContact, move |event| {
                    match Phone::from_contact(payload(event)) {
                        Ok(phone) => Step::Run {
                            effect: Effect::FindShopByPhone(phone.clone()),
                            then: Resume::ShopLookup { phone },
                        },
                        Err(_) => {
                            self.enter(state.clone(), Some(self.prompts.own_contact_required()))
                        }
                    }
                }),
                rule(Guard::AnyContact, move |_| {
                    self.enter(state.clone(), Some(self.prompts.own_contact_required()))
                }),
            ],

            S::AwaitShopName { phone } => vec![rule(Guard::AnyText, move |event| {
                match validate::text(payload(event)) {
                    Ok(name) => self.enter(
                        S::AwaitShopLocation {
                            phone: phone.clone(),
                            name,
                        },
                        None,
                    ),
                    Err(invalid) => self.refuse(state, invalid),
                }
            })],

            S::AwaitShopLocation { phone, name } => vec![rule(Guard::AnyText, move |event| {
                match validate::text(payload(event)) {
                    Ok(location) => Step::Run {
                        effect: Effect::CreateShop(NewShop {
                            name: name.clone(),
                            location,
                            phone: phone.clone(),
                        }),
                        then: Resume::ShopCreated {
                            phone: phone.clone(),
                            name: name.clone(),
                        },
                    },
                    Err(invalid) => self.refuse(state, invalid),
                }
            })],

            S::ShopMenu { shop } => vec![
                rule(Guard::Choice("search"), move |_| {
                    self.enter(S::AwaitSearchPhone { shop: shop.clone() }, None)
                }),
                rule(Guard::Choice("add"), move |_| {
                    self.enter(S::AwaitNewName { shop: shop.clone() }, None)
                }),
                rule(Guard::Choice("list"), move |_| {
                    self.enter(S::ListDebtors { shop: shop.clone() }, None)
                }),
            ],

            S::AwaitSearchPhone { shop } => vec![rule(Guard::AnyText, move |event| {
                match self.phone_format.parse(payload(event)) {
                    Ok(phone) => Step::Run {
                        effect: Effect::FindDebtorByPhone {
                            shop_id: shop.id.clone(),
                            phone,
                        },
                        then: Resume::SearchLookup { shop: shop.clone() },
                    },
                    Err(_) => self.refuse_phone(state),
                }
            })],

            S::AwaitNewName { shop } => vec![rule(Guard::AnyText, move |event| {
                match validate::text(payload(event)) {
                    Ok(name) => self.enter(
                        S::AwaitNewNickname {
                            shop: shop.clone(),
                            name,
                        },
                        None,
                    ),
                    Err(invalid) => self.refuse(state, invalid),
                }
            })],

            S::AwaitNewNickname { shop, name } => vec![rule(Guard::AnyText, move |event| {
                match validate::text(payload(event)) {
                    Ok(nickname) => self.enter(
                        S::AwaitNewPhone {
                            shop: shop.clone(),
                            name: name.clone(),
                            nickname,
                        },
                        None,
                    ),
                    Err(invalid) => self.refuse(state, invalid),
                }
            })],

            S::AwaitNewPhone {
                shop,
                name,
                nickname,
            } => vec![rule(Guard::AnyText, move |event| {
                match self.phone_format.parse(payload(event)) {
                    Ok(phone) => Step::Run {
                        effect: Effect::FindDebtorByPhone {
                            shop_id: shop.id.clone(),
                            phone: phone.clone(),
                        },
                        then: Resume::NewPhoneLookup {
                            shop: shop.clone(),
                            name: name.clone(),
                            nickname: nickname.clone(),
                            phone,
                        },
                    },
                    Err(_) => self.refuse_phone(state),
                }
            })],

            S::AwaitExistingChoice {
                shop,
                name,
                nickname,
                existing,
                ..
            } => vec![
                rule(Guard::Choice(token::EXISTING), move |_| {
                    self.enter(
                        S::DebtorDetail {
                            shop: shop.clone(),
                            debtor: existing.clone(),
                            origin: Origin::Menu,
                        },
                        None,
                    )
                }),
                rule(Guard::Choice(token::ANOTHER), move |_| {
                    self.enter(
                        S::AwaitNewPhone {
                            shop: shop.clone(),
                            name: name.clone(),
                            nickname: nickname.clone(),
                        },
                        None,
                    )
                }),
            ],

            S::AwaitNewAmount {
                shop,
                name,
                nickname,
                phone,
            } => vec![rule(Guard::AnyText, move |event| {
                match validate::non_negative_amount(payload(event)) {
                    Ok(amount) => self.enter(
                        S::ConfirmNewDebtor {
                            shop: shop.clone(),
                            draft: DebtorDraft {
                                name: name.clone(),
                                nickname: nickname.clone(),
                                phone: phone.clone(),
                                amount,
                            },
                        },
                        None,
                    ),
                    Err(invalid) => self.refuse(state, invalid),
                }
            })],

            S::ConfirmNewDebtor { shop, draft } => vec![
                rule(Guard::Choice(token::CONFIRM), move |_| Step::Run {
                    effect: Effect::CreateDebtor(NewDebtor {
                        shop_id: shop.id.clone(),
                        name: draft.name.clone(),
                        nickname: draft.nickname.clone(),
                        phone: draft.phone.clone(),
                        initial_amount: draft.amount,
                    }),
                    then: Resume::DebtorCreated {
                        shop: shop.clone(),
                        draft: draft.clone(),
                    },
                }),
                rule(Guard::Choice(token::REJECT), move |_| {
                    self.enter(S::AwaitNewName { shop: shop.clone() }, None)
                }),
            ],

            S::ListDebtors { shop } => vec![
                rule(Guard::Button(token::BACK), move |_| {
                    self.enter(S::ShopMenu { shop: shop.clone() }, None)
                }),
                rule(Guard::AnyButton, move |event| Step::Run {
                    effect: Effect::GetDebtor(DebtorId(payload(event).to_string())),
                    then: Resume::ShowDebtor {
                        shop: shop.clone(),
                        origin: Origin::List,
                        notice: None,
                    },
                }),
            ],

            S::DebtorDetail {
                shop,
                debtor,
                origin,
            } => vec![
                rule(Guard::Button(token::DEBT), move |_| {
                    self.enter(
                        S::AwaitDebtAmount {
                            shop: shop.clone(),
                            debtor: debtor.clone(),
                            origin: *origin,
                        },
                        None,
                    )
                }),
                rule(Guard::Button(token::PAYMENT), move |_| {
                    self.enter(
                        S::AwaitPaymentAmount {
                            shop: shop.clone(),
                            debtor: debtor.clone(),
                            origin: *origin,
                        },
                        None,
                    )
                }),
                rule(Guard::Choice(token::HISTORY), move |_| Step::Run {
                    effect: Effect::GetDebtor(debtor.clone()),
                    then: Resume::ShowHistory {
                        shop: shop.clone(),
                        origin: *origin,
                    },
                }),
                rule(Guard::Choice(token::BACK), move |_| {
                    self.enter(origin_state(shop.clone(), *origin), None)
                }),
            ],

            S::AwaitDebtAmount {
                shop,
                debtor,
                origin,
            } => self.amount_rules(state, shop, debtor, *origin, true),

            S::AwaitPaymentAmount {
                shop,
                debtor,
                origin,
            } => self.amount_rules(state, shop, debtor, *origin, false),

            S::DebtorSignedIn { phone } => vec![rule(Guard::Choice("debts"), move |_| {
                Step::Run {
                    effect: Effect::FindDebtsByPhone(phone.clone()),
                    then: Resume::ShowDebts {
                        phone: phone.clone(),
                    },
                }
            })],
        };
        rules.extend(own);
        rules
    }

    /// Shared rules for the debt and payment amount prompts.
    fn amount_rules<'a>(
        &'a self,
        state: &'a DialogueState,
        shop: &'a ShopSession,
        debtor: &'a DebtorId,
        origin: Origin,
        is_debt: bool,
    ) -> Vec<Rule<'a>> {
        let detail = move || DialogueState::DebtorDetail {
            shop: shop.clone(),
            debtor: debtor.clone(),
            origin,
        };
        vec![
            rule(Guard::Choice(token::BACK), move |_| self.enter(detail(), None)),
            rule(Guard::AnyText, move |event| {
                match validate::positive_amount(payload(event)) {
                    Ok(amount) => {
                        let (effect, notice) = if is_debt {
                            (
                                Effect::RecordDebt {
                                    debtor: debtor.clone(),
                                    amount,
                                },
                                self.prompts.debt_recorded(amount),
                            )
                        } else {
                            (
                                Effect::RecordPayment {
                                    debtor: debtor.clone(),
                                    amount,
                                },
                                self.prompts.payment_recorded(amount),
                            )
                        };
                        Step::Run {
                            effect,
                            then: Resume::Recorded {
                                retry: state.clone(),
                                shop: shop.clone(),
                                origin,
                                notice,
                            },
                        }
                    }
                    Err(invalid) => self.refuse(state, invalid),
                }
            }),
        ]
    }
}

/// The state "back" from `DebtorDetail` returns to.
fn origin_state(shop: ShopSession, origin: Origin) -> DialogueState {
    match origin {
        Origin::Search => DialogueState::AwaitSearchPhone { shop },
        Origin::List => DialogueState::ListDebtors { shop },
        Origin::Menu => DialogueState::ShopMenu { shop },
    }
}
