// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The ledger use cases invoked by the dialogue engine.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use qarz_core::types::{
    Debtor, DebtorId, NewDebtor, NewShop, Phone, Shop, ShopDebt, ShopId, Transaction,
    TransactionKind,
};
use qarz_core::time::now;
use qarz_core::{LedgerStore, MAX_AMOUNT, QarzError};
use tracing::{debug, info};

/// Ledger operations over a [`LedgerStore`].
///
/// Cheap to clone; all clones share the same store.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    timeout: Duration,
}

impl Ledger {
    /// Create a ledger whose store calls each give up after `timeout`.
    pub fn new(store: Arc<dyn LedgerStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Run one store call under the configured bound.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, QarzError>>,
    ) -> Result<T, QarzError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| QarzError::Timeout {
                duration: self.timeout,
            })?
    }

    /// Register a shop. Fails with `DuplicatePhone` if the phone is taken.
    pub async fn create_shop(&self, new: NewShop) -> Result<ShopId, QarzError> {
        require_text("shop name", &new.name)?;
        require_text("shop location", &new.location)?;

        if self
            .bounded(self.store.find_shop_by_phone(&new.phone))
            .await?
            .is_some()
        {
            return Err(QarzError::DuplicatePhone {
                phone: new.phone.to_string(),
            });
        }

        let shop = Shop {
            id: ShopId::generate(),
            name: new.name.trim().to_string(),
            location: new.location.trim().to_string(),
            phone: new.phone,
            debtors: Vec::new(),
            created_at: now(),
        };
        self.bounded(self.store.insert_shop(&shop)).await?;
        info!(shop_id = %shop.id, phone = %shop.phone, "shop registered");
        Ok(shop.id)
    }

    pub async fn find_shop_by_phone(&self, phone: &Phone) -> Result<Shop, QarzError> {
        self.bounded(self.store.find_shop_by_phone(phone))
            .await?
            .ok_or_else(|| QarzError::shop_not_found(phone.to_string()))
    }

    pub async fn get_shop(&self, id: &ShopId) -> Result<Shop, QarzError> {
        self.bounded(self.store.get_shop(id))
            .await?
            .ok_or_else(|| QarzError::shop_not_found(id.to_string()))
    }

    /// Enroll a debtor under a shop.
    ///
    /// A nonzero opening amount is logged as a DEBT transaction so the
    /// balance reconciles with the log from the first write.
    pub async fn create_debtor(&self, new: NewDebtor) -> Result<DebtorId, QarzError> {
        require_text("debtor name", &new.name)?;
        require_text("debtor nickname", &new.nickname)?;
        if new.initial_amount < 0 {
            return Err(QarzError::Validation(
                "opening amount must not be negative".to_string(),
            ));
        }
        if new.initial_amount > MAX_AMOUNT {
            return Err(QarzError::Validation(format!(
                "opening amount must not exceed {MAX_AMOUNT}"
            )));
        }

        let created_at = now();
        let transactions = if new.initial_amount > 0 {
            vec![Transaction {
                kind: TransactionKind::Debt,
                amount: new.initial_amount,
                created_at: created_at.clone(),
            }]
        } else {
            Vec::new()
        };
        let debtor = Debtor {
            id: DebtorId::generate(),
            shop_id: new.shop_id,
            name: new.name.trim().to_string(),
            nickname: new.nickname.trim().to_string(),
            phone: new.phone,
            debt_amount: new.initial_amount,
            transactions,
            created_at,
        };
        self.bounded(self.store.insert_debtor(&debtor)).await?;
        info!(
            shop_id = %debtor.shop_id,
            debtor_id = %debtor.id,
            amount = debtor.debt_amount,
            "debtor enrolled"
        );
        Ok(debtor.id)
    }

    /// Look a phone up in the shop's debtor reference index.
    pub async fn find_debtor_by_phone(
        &self,
        shop_id: &ShopId,
        phone: &Phone,
    ) -> Result<DebtorId, QarzError> {
        let shop = self.get_shop(shop_id).await?;
        shop.debtors
            .into_iter()
            .find(|r| &r.phone == phone)
            .map(|r| r.debtor_id)
            .ok_or_else(|| QarzError::debtor_not_found(phone.to_string()))
    }

    pub async fn get_debtor(&self, id: &DebtorId) -> Result<Debtor, QarzError> {
        self.bounded(self.store.get_debtor(id))
            .await?
            .ok_or_else(|| QarzError::debtor_not_found(id.to_string()))
    }

    /// Every debtor of the shop, in enrollment order.
    pub async fn list_debtors(&self, shop_id: &ShopId) -> Result<Vec<Debtor>, QarzError> {
        let debtors = self.bounded(self.store.list_debtors(shop_id)).await?;
        debug!(shop_id = %shop_id, count = debtors.len(), "listed debtors");
        Ok(debtors)
    }

    /// Add to a debtor's balance.
    pub async fn record_debt(&self, id: &DebtorId, amount: i64) -> Result<Debtor, QarzError> {
        self.record(id, TransactionKind::Debt, amount).await
    }

    /// Subtract from a debtor's balance. The balance may go negative (a credit).
    pub async fn record_payment(&self, id: &DebtorId, amount: i64) -> Result<Debtor, QarzError> {
        self.record(id, TransactionKind::Payment, amount).await
    }

    async fn record(
        &self,
        id: &DebtorId,
        kind: TransactionKind,
        amount: i64,
    ) -> Result<Debtor, QarzError> {
        if amount <= 0 {
            return Err(QarzError::Validation(format!(
                "{kind} amount must be positive"
            )));
        }
        if amount > MAX_AMOUNT {
            return Err(QarzError::Validation(format!(
                "{kind} amount must not exceed {MAX_AMOUNT}"
            )));
        }
        let transaction = Transaction {
            kind,
            amount,
            created_at: now(),
        };
        let debtor = self
            .bounded(self.store.append_transaction(id, &transaction))
            .await?;
        info!(
            debtor_id = %id,
            %kind,
            amount,
            balance = debtor.debt_amount,
            "transaction recorded"
        );
        Ok(debtor)
    }

    /// What a phone number owes, shop by shop.
    pub async fn find_debts_by_phone(&self, phone: &Phone) -> Result<Vec<ShopDebt>, QarzError> {
        self.bounded(self.store.find_debts_by_phone(phone)).await
    }
}

fn require_text(field: &str, value: &str) -> Result<(), QarzError> {
    if value.trim().is_empty() {
        Err(QarzError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use qarz_config::model::StorageConfig;
    use qarz_storage::SqliteStore;

    async fn ledger() -> Ledger {
        let store = SqliteStore::new(StorageConfig {
            database_path: ":memory:".into(),
            wal_mode: false,
        });
        store.initialize().await.unwrap();
        Ledger::new(Arc::new(store), Duration::from_secs(5))
    }

    fn phone(raw: &str) -> Phone {
        Phone::from_canonical(raw.to_string())
    }

    async fn shop(ledger: &Ledger, name: &str, raw_phone: &str) -> ShopId {
        ledger
            .create_shop(NewShop {
                name: name.into(),
                location: "Tashkent".into(),
                phone: phone(raw_phone),
            })
            .await
            .unwrap()
    }

    fn new_debtor(shop_id: &ShopId, name: &str, raw_phone: &str, amount: i64) -> NewDebtor {
        NewDebtor {
            shop_id: shop_id.clone(),
            name: name.into(),
            nickname: name.to_lowercase(),
            phone: phone(raw_phone),
            initial_amount: amount,
        }
    }

    #[tokio::test]
    async fn opening_amount_is_logged_as_debt() {
        let ledger = ledger().await;
        let shop_id = shop(&ledger, "Baraka", "+998900000100").await;
        let id = ledger
            .create_debtor(new_debtor(&shop_id, "Ali", "+998901234567", 10_000))
            .await
            .unwrap();

        let debtor = ledger.get_debtor(&id).await.unwrap();
        assert_eq!(debtor.debt_amount, 10_000);
        assert_eq!(debtor.transactions.len(), 1);
        assert_eq!(debtor.transactions[0].kind, TransactionKind::Debt);
        assert_eq!(debtor.transactions[0].amount, 10_000);
    }

    #[tokio::test]
    async fn debt_then_payment() {
        let ledger = ledger().await;
        let shop_id = shop(&ledger, "Baraka", "+998900000100").await;
        let id = ledger
            .create_debtor(new_debtor(&shop_id, "Ali", "+998901234567", 0))
            .await
            .unwrap();

        ledger.record_debt(&id, 5000).await.unwrap();
        ledger.record_payment(&id, 2000).await.unwrap();

        let debtor = ledger.get_debtor(&id).await.unwrap();
        assert_eq!(debtor.debt_amount, 3000);
        let log: Vec<(TransactionKind, i64)> = debtor
            .transactions
            .iter()
            .map(|t| (t.kind, t.amount))
            .collect();
        assert_eq!(
            log,
            vec![(TransactionKind::Debt, 5000), (TransactionKind::Payment, 2000)]
        );
    }

    #[tokio::test]
    async fn overpayment_becomes_credit() {
        let ledger = ledger().await;
        let shop_id = shop(&ledger, "Baraka", "+998900000100").await;
        let id = ledger
            .create_debtor(new_debtor(&shop_id, "Ali", "+998901234567", 1000))
            .await
            .unwrap();
        let debtor = ledger.record_payment(&id, 1500).await.unwrap();
        assert_eq!(debtor.debt_amount, -500);
        assert!(debtor.is_reconciled());
    }

    #[tokio::test]
    async fn duplicate_phone_in_shop_keeps_one_debtor() {
        let ledger = ledger().await;
        let shop_id = shop(&ledger, "Baraka", "+998900000100").await;
        ledger
            .create_debtor(new_debtor(&shop_id, "A", "+998900000001", 0))
            .await
            .unwrap();
        let err = ledger
            .create_debtor(new_debtor(&shop_id, "B", "+998900000001", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, QarzError::DuplicatePhoneInShop { .. }));
        assert_eq!(ledger.list_debtors(&shop_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_shop_phone_is_rejected() {
        let ledger = ledger().await;
        shop(&ledger, "Baraka", "+998900000100").await;
        let err = ledger
            .create_shop(NewShop {
                name: "Other".into(),
                location: "Samarkand".into(),
                phone: phone("+998900000100"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, QarzError::DuplicatePhone { .. }));
    }

    #[tokio::test]
    async fn cross_shop_debts_view() {
        let ledger = ledger().await;
        let x = shop(&ledger, "ShopX", "+998900000100").await;
        let y = shop(&ledger, "ShopY", "+998900000200").await;
        ledger
            .create_debtor(new_debtor(&x, "Vali", "+998901111111", 1000))
            .await
            .unwrap();
        ledger
            .create_debtor(new_debtor(&y, "Vali", "+998901111111", 2000))
            .await
            .unwrap();

        let mut debts: Vec<(String, i64)> = ledger
            .find_debts_by_phone(&phone("+998901111111"))
            .await
            .unwrap()
            .into_iter()
            .map(|d| (d.shop_name, d.debt_amount))
            .collect();
        debts.sort();
        assert_eq!(
            debts,
            vec![("ShopX".to_string(), 1000), ("ShopY".to_string(), 2000)]
        );
    }

    #[tokio::test]
    async fn find_debtor_by_phone_scans_shop_refs() {
        let ledger = ledger().await;
        let x = shop(&ledger, "ShopX", "+998900000100").await;
        let y = shop(&ledger, "ShopY", "+998900000200").await;
        let id = ledger
            .create_debtor(new_debtor(&x, "Vali", "+998901111111", 0))
            .await
            .unwrap();

        assert_eq!(
            ledger.find_debtor_by_phone(&x, &phone("+998901111111")).await.unwrap(),
            id
        );
        let miss = ledger
            .find_debtor_by_phone(&y, &phone("+998901111111"))
            .await
            .unwrap_err();
        assert!(matches!(miss, QarzError::NotFound { entity: "debtor", .. }));
    }

    #[tokio::test]
    async fn rejects_non_positive_amounts_and_blank_names() {
        let ledger = ledger().await;
        let shop_id = shop(&ledger, "Baraka", "+998900000100").await;
        let id = ledger
            .create_debtor(new_debtor(&shop_id, "Ali", "+998901234567", 0))
            .await
            .unwrap();

        assert!(matches!(
            ledger.record_debt(&id, 0).await,
            Err(QarzError::Validation(_))
        ));
        assert!(matches!(
            ledger.record_payment(&id, -5).await,
            Err(QarzError::Validation(_))
        ));
        assert!(matches!(
            ledger
                .create_debtor(new_debtor(&shop_id, "  ", "+998907654321", 0))
                .await,
            Err(QarzError::Validation(_))
        ));
        assert!(matches!(
            ledger
                .create_debtor(new_debtor(&shop_id, "Bob", "+998907654321", -1))
                .await,
            Err(QarzError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn amounts_are_capped_and_balance_stays_readable() {
        let ledger = ledger().await;
        let shop_id = shop(&ledger, "Baraka", "+998900000100").await;
        assert!(matches!(
            ledger
                .create_debtor(new_debtor(&shop_id, "Ali", "+998901234567", MAX_AMOUNT + 1))
                .await,
            Err(QarzError::Validation(_))
        ));
        let id = ledger
            .create_debtor(new_debtor(&shop_id, "Ali", "+998901234567", MAX_AMOUNT))
            .await
            .unwrap();

        assert!(matches!(
            ledger.record_debt(&id, i64::MAX).await,
            Err(QarzError::Validation(_))
        ));
        assert!(matches!(
            ledger.record_debt(&id, 1).await,
            Err(QarzError::Validation(_))
        ));
        let debtor = ledger.record_payment(&id, 1).await.unwrap();
        assert_eq!(debtor.debt_amount, MAX_AMOUNT - 1);

        let listed = ledger.list_debtors(&shop_id).await.unwrap();
        assert_eq!(listed[0].debt_amount, MAX_AMOUNT - 1);
        assert!(listed[0].is_reconciled());
    }

    #[tokio::test]
    async fn payments_cannot_push_credit_past_the_floor() {
        let ledger = ledger().await;
        let shop_id = shop(&ledger, "Baraka", "+998900000100").await;
        let id = ledger
            .create_debtor(new_debtor(&shop_id, "Ali", "+998901234567", 0))
            .await
            .unwrap();
        ledger.record_payment(&id, MAX_AMOUNT).await.unwrap();

        assert!(matches!(
            ledger.record_payment(&id, 1).await,
            Err(QarzError::Validation(_))
        ));
        let debtor = ledger.get_debtor(&id).await.unwrap();
        assert_eq!(debtor.debt_amount, -MAX_AMOUNT);
        assert_eq!(debtor.transactions.len(), 1);
        assert_eq!(
            ledger.find_debts_by_phone(&phone("+998901234567")).await.unwrap()[0].debt_amount,
            -MAX_AMOUNT
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_records_lose_no_update() {
        let ledger = ledger().await;
        let shop_id = shop(&ledger, "Baraka", "+998900000100").await;
        let id = ledger
            .create_debtor(new_debtor(&shop_id, "Ali", "+998901234567", 0))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..100)
            .map(|i| {
                let ledger = ledger.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    if i % 4 == 0 {
                        ledger.record_payment(&id, 3).await
                    } else {
                        ledger.record_debt(&id, 7).await
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let debtor = ledger.get_debtor(&id).await.unwrap();
        assert_eq!(debtor.transactions.len(), 100);
        assert_eq!(debtor.debt_amount, 75 * 7 - 25 * 3);
        assert!(debtor.is_reconciled());
    }

    #[tokio::test]
    async fn stalled_store_call_times_out() {
        let ledger = ledger().await;
        let ledger = Ledger::new(ledger.store.clone(), Duration::from_millis(20));
        let err = ledger
            .bounded(std::future::pending::<Result<(), QarzError>>())
            .await
            .unwrap_err();
        assert!(matches!(err, QarzError::Timeout { .. }));
        assert!(err.is_transient());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn balance_always_reconciles(
            opening in 0i64..50_000,
            entries in proptest::collection::vec((any::<bool>(), 1i64..100_000), 0..12),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let ledger = ledger().await;
                let shop_id = shop(&ledger, "Baraka", "+998900000100").await;
                let id = ledger
                    .create_debtor(new_debtor(&shop_id, "Ali", "+998901234567", opening))
                    .await
                    .unwrap();

                let mut expected = opening;
                for (is_debt, amount) in &entries {
                    let debtor = if *is_debt {
                        expected += amount;
                        ledger.record_debt(&id, *amount).await.unwrap()
                    } else {
                        expected -= amount;
                        ledger.record_payment(&id, *amount).await.unwrap()
                    };
                    assert!(debtor.is_reconciled());
                }

                let debtor = ledger.get_debtor(&id).await.unwrap();
                assert_eq!(debtor.debt_amount, expected);
                assert!(debtor.is_reconciled());
            });
        }
    }
}
