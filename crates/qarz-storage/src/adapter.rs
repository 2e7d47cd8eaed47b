// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ledger and session store traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use qarz_config::model::StorageConfig;
use qarz_core::types::{
    Debtor, DebtorId, Phone, SessionRecord, Shop, ShopDebt, ShopId, Transaction,
};
use qarz_core::{AdapterType, HealthStatus, LedgerStore, PluginAdapter, QarzError, SessionStore};

use crate::database::{self, Database};
use crate::queries;

/// SQLite-backed ledger and session store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily opened on the first call to
/// [`LedgerStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new store with the given configuration.
    ///
    /// The database connection is not opened until [`LedgerStore::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, QarzError> {
        self.db.get().ok_or_else(|| QarzError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, QarzError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), QarzError> {
        if let Some(db) = self.db.get() {
            database::checkpoint(db.connection()).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn initialize(&self) -> Result<(), QarzError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| QarzError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), QarzError> {
        database::checkpoint(self.db()?.connection()).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn insert_shop(&self, shop: &Shop) -> Result<(), QarzError> {
        queries::shops::insert_shop(self.db()?, shop).await
    }

    async fn get_shop(&self, id: &ShopId) -> Result<Option<Shop>, QarzError> {
        queries::shops::get_shop(self.db()?, id).await
    }

    async fn find_shop_by_phone(&self, phone: &Phone) -> Result<Option<Shop>, QarzError> {
        queries::shops::find_shop_by_phone(self.db()?, phone).await
    }

    async fn insert_debtor(&self, debtor: &Debtor) -> Result<(), QarzError> {
        queries::debtors::insert_debtor(self.db()?, debtor).await
    }

    async fn get_debtor(&self, id: &DebtorId) -> Result<Option<Debtor>, QarzError> {
        queries::debtors::get_debtor(self.db()?, id).await
    }

    async fn list_debtors(&self, shop_id: &ShopId) -> Result<Vec<Debtor>, QarzError> {
        queries::debtors::list_debtors(self.db()?, shop_id).await
    }

    async fn append_transaction(
        &self,
        id: &DebtorId,
        transaction: &Transaction,
    ) -> Result<Debtor, QarzError> {
        queries::debtors::append_transaction(self.db()?, id, transaction).await
    }

    async fn find_debts_by_phone(&self, phone: &Phone) -> Result<Vec<ShopDebt>, QarzError> {
        queries::debtors::find_debts_by_phone(self.db()?, phone).await
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get_session(&self, identity: &str) -> Result<Option<SessionRecord>, QarzError> {
        queries::sessions::get_session(self.db()?, identity).await
    }

    async fn save_session(&self, record: &SessionRecord) -> Result<(), QarzError> {
        queries::sessions::save_session(self.db()?, record).await
    }

    async fn clear_session(&self, identity: &str) -> Result<(), QarzError> {
        queries::sessions::clear_session(self.db()?, identity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_at(path: &std::path::Path) -> StorageConfig {
        StorageConfig {
            database_path: path.display().to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn uninitialized_store_reports_storage_error() {
        let store = SqliteStore::new(StorageConfig::default());
        let err = store
            .get_shop(&ShopId("s1".into()))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn double_initialize_fails() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(config_at(&dir.path().join("q.db")));
        store.initialize().await.unwrap();
        assert!(store.initialize().await.is_err());
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("persist.db");
        let shop = Shop {
            id: ShopId("s1".into()),
            name: "Baraka".into(),
            location: "Chorsu".into(),
            phone: Phone::from_canonical("+998900000001".into()),
            debtors: Vec::new(),
            created_at: "2026-01-01T00:00:00Z".into(),
        };

        let store = SqliteStore::new(config_at(&path));
        store.initialize().await.unwrap();
        store.insert_shop(&shop).await.unwrap();
        store
            .save_session(&SessionRecord {
                identity: "7".into(),
                state: "{}".into(),
                updated_at: "t".into(),
            })
            .await
            .unwrap();
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        store.close().await.unwrap();
        drop(store);

        let reopened = SqliteStore::new(config_at(&path));
        reopened.initialize().await.unwrap();
        assert_eq!(reopened.get_shop(&shop.id).await.unwrap(), Some(shop));
        assert!(reopened.get_session("7").await.unwrap().is_some());
    }
}
