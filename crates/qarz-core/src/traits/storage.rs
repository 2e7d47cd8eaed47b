// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits for the ledger and for dialogue sessions.

use async_trait::async_trait;

use crate::error::QarzError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Debtor, DebtorId, Phone, SessionRecord, Shop, ShopDebt, ShopId, Transaction,
};

/// Durable storage for shops and debtors.
///
/// Every method touches a single logical document and is atomic on its own.
/// Implementations must report every failure as an error; callers never
/// infer success from a missing error path.
#[async_trait]
pub trait LedgerStore: PluginAdapter {
    /// Initializes the backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), QarzError>;

    /// Closes the backend, flushing pending writes.
    async fn close(&self) -> Result<(), QarzError>;

    /// Inserts a new shop. Fails with `DuplicatePhone` if the phone is taken.
    async fn insert_shop(&self, shop: &Shop) -> Result<(), QarzError>;

    async fn get_shop(&self, id: &ShopId) -> Result<Option<Shop>, QarzError>;

    async fn find_shop_by_phone(&self, phone: &Phone) -> Result<Option<Shop>, QarzError>;

    /// Inserts a debtor with its opening transactions and appends the
    /// `{debtor_id, phone}` reference to the owning shop in one unit.
    ///
    /// Fails with `DuplicatePhoneInShop` when the shop already references
    /// the phone, leaving nothing written.
    async fn insert_debtor(&self, debtor: &Debtor) -> Result<(), QarzError>;

    async fn get_debtor(&self, id: &DebtorId) -> Result<Option<Debtor>, QarzError>;

    /// All debtors of a shop in reference insertion order.
    async fn list_debtors(&self, shop_id: &ShopId) -> Result<Vec<Debtor>, QarzError>;

    /// Appends a transaction and moves the balance by its signed amount as a
    /// single atomic step. Returns the updated debtor.
    async fn append_transaction(
        &self,
        id: &DebtorId,
        transaction: &Transaction,
    ) -> Result<Debtor, QarzError>;

    /// Every debtor record with this phone across all shops, paired with the
    /// owning shop's name.
    async fn find_debts_by_phone(&self, phone: &Phone) -> Result<Vec<ShopDebt>, QarzError>;
}

/// Durable per-identity dialogue sessions.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn get_session(&self, identity: &str) -> Result<Option<SessionRecord>, QarzError>;

    /// Replaces the whole session record atomically.
    async fn save_session(&self, record: &SessionRecord) -> Result<(), QarzError>;

    async fn clear_session(&self, identity: &str) -> Result<(), QarzError>;
}
