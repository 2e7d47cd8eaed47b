// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A SQLite store that can be switched into an "unavailable" mode.
//!
//! Used to check that transient store failures never advance a dialogue.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use qarz_core::types::{
    AdapterType, Debtor, DebtorId, HealthStatus, Phone, SessionRecord, Shop, ShopDebt, ShopId,
    Transaction,
};
use qarz_core::{LedgerStore, PluginAdapter, QarzError, SessionStore};
use qarz_storage::SqliteStore;

/// Wraps a [`SqliteStore`], failing selected calls with a storage error.
pub struct FlakyStore {
    inner: SqliteStore,
    ledger_down: AtomicBool,
    sessions_down: AtomicBool,
    session_writes_down: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            ledger_down: AtomicBool::new(false),
            sessions_down: AtomicBool::new(false),
            session_writes_down: AtomicBool::new(false),
        }
    }

    /// Fail every ledger call while `down` is set.
    pub fn set_ledger_down(&self, down: bool) {
        self.ledger_down.store(down, Ordering::SeqCst);
    }

    /// Fail every session call while `down` is set.
    pub fn set_sessions_down(&self, down: bool) {
        self.sessions_down.store(down, Ordering::SeqCst);
    }

    /// Fail session saves and clears while `down` is set; reads still work.
    pub fn set_session_writes_down(&self, down: bool) {
        self.session_writes_down.store(down, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> Result<(), QarzError> {
        if flag.load(Ordering::SeqCst) {
            return Err(QarzError::Storage {
                source: "store unavailable".into(),
            });
        }
        Ok(())
    }

    fn check_ledger(&self) -> Result<(), QarzError> {
        Self::check(&self.ledger_down)
    }

    fn check_session_write(&self) -> Result<(), QarzError> {
        Self::check(&self.sessions_down)?;
        Self::check(&self.session_writes_down)
    }
}

#[async_trait]
impl PluginAdapter for FlakyStore {
    fn name(&self) -> &str {
        "flaky-sqlite"
    }

    fn version(&self) -> semver::Version {
        self.inner.version()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, QarzError> {
        if self.ledger_down.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("store unavailable".into()));
        }
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), QarzError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl LedgerStore for FlakyStore {
    async fn initialize(&self) -> Result<(), QarzError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), QarzError> {
        self.inner.close().await
    }

    async fn insert_shop(&self, shop: &Shop) -> Result<(), QarzError> {
        self.check_ledger()?;
        self.inner.insert_shop(shop).await
    }

    async fn get_shop(&self, id: &ShopId) -> Result<Option<Shop>, QarzError> {
        self.check_ledger()?;
        self.inner.get_shop(id).await
    }

    async fn find_shop_by_phone(&self, phone: &Phone) -> Result<Option<Shop>, QarzError> {
        self.check_ledger()?;
        self.inner.find_shop_by_phone(phone).await
    }

    async fn insert_debtor(&self, debtor: &Debtor) -> Result<(), QarzError> {
        self.check_ledger()?;
        self.inner.insert_debtor(debtor).await
    }

    async fn get_debtor(&self, id: &DebtorId) -> Result<Option<Debtor>, QarzError> {
        self.check_ledger()?;
        self.inner.get_debtor(id).await
    }

    async fn list_debtors(&self, shop_id: &ShopId) -> Result<Vec<Debtor>, QarzError> {
        self.check_ledger()?;
        self.inner.list_debtors(shop_id).await
    }

    async fn append_transaction(
        &self,
        id: &DebtorId,
        transaction: &Transaction,
    ) -> Result<Debtor, QarzError> {
        self.check_ledger()?;
        self.inner.append_transaction(id, transaction).await
    }

    async fn find_debts_by_phone(&self, phone: &Phone) -> Result<Vec<ShopDebt>, QarzError> {
        self.check_ledger()?;
        self.inner.find_debts_by_phone(phone).await
    }
}

#[async_trait]
impl SessionStore for FlakyStore {
    async fn get_session(&self, identity: &str) -> Result<Option<SessionRecord>, QarzError> {
        Self::check(&self.sessions_down)?;
        self.inner.get_session(identity).await
    }

    async fn save_session(&self, record: &SessionRecord) -> Result<(), QarzError> {
        self.check_session_write()?;
        self.inner.save_session(record).await
    }

    async fn clear_session(&self, identity: &str) -> Result<(), QarzError> {
        self.check_session_write()?;
        self.inner.clear_session(identity).await
    }
}

#[cfg(test)]
mod tests {
    use qarz_config::model::StorageConfig;

    use super::*;

    async fn store() -> FlakyStore {
        let store = FlakyStore::new(SqliteStore::new(StorageConfig {
            database_path: ":memory:".into(),
            wal_mode: false,
        }));
        store.initialize().await.unwrap();
        store
    }

    #[tokio::test]
    async fn ledger_failures_are_transient_and_reversible() {
        let store = store().await;
        let phone = Phone::from_canonical("+998901234567".into());

        store.set_ledger_down(true);
        let err = store.find_shop_by_phone(&phone).await.unwrap_err();
        assert!(err.is_transient());

        store.set_ledger_down(false);
        assert!(store.find_shop_by_phone(&phone).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn session_writes_can_fail_while_reads_work() {
        let store = store().await;
        store.set_session_writes_down(true);
        assert!(store.get_session("1").await.unwrap().is_none());
        assert!(store.clear_session("1").await.unwrap_err().is_transient());
    }
}
