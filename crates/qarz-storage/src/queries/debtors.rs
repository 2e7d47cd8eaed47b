// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Debtor queries and the append-only transaction log.
//!
//! Every write runs in a single SQLite transaction so that the debtor row,
//! its log, and the owning shop's reference index never disagree.

use std::str::FromStr;

use qarz_core::types::{
    Debtor, DebtorId, MAX_AMOUNT, Phone, ShopDebt, ShopId, Transaction, TransactionKind,
};
use qarz_core::QarzError;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension};

use crate::database::{is_unique_violation, map_tr_err, Database};

const DEBTOR_COLUMNS: &str = "d.id, d.shop_id, d.name, d.nickname, d.phone, d.debt_amount, d.created_at";

/// Why an insert was refused without writing anything.
enum InsertRefusal {
    MissingShop,
    DuplicatePhone { existing: String },
}

/// Insert a debtor, its opening transactions, and the shop reference as one unit.
pub async fn insert_debtor(db: &Database, debtor: &Debtor) -> Result<(), QarzError> {
    let debtor = debtor.clone();
    let shop_id = debtor.shop_id.0.clone();
    let phone = debtor.phone.to_string();

    let outcome = db
        .connection()
        .call(move |conn| -> Result<Result<(), InsertRefusal>, rusqlite::Error> {
            let tx = conn.transaction()?;

            let shop_exists = tx
                .query_row("SELECT 1 FROM shops WHERE id = ?1", [&debtor.shop_id.0], |_| Ok(()))
                .optional()?
                .is_some();
            if !shop_exists {
                return Ok(Err(InsertRefusal::MissingShop));
            }

            if let Some(existing) = find_ref(&tx, &debtor.shop_id.0, debtor.phone.as_str())? {
                return Ok(Err(InsertRefusal::DuplicatePhone { existing }));
            }

            tx.execute(
                "INSERT INTO debtors (id, shop_id, name, nickname, phone, debt_amount, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    debtor.id.0,
                    debtor.shop_id.0,
                    debtor.name,
                    debtor.nickname,
                    debtor.phone.as_str(),
                    debtor.debt_amount,
                    debtor.created_at,
                ],
            )?;
            for transaction in &debtor.transactions {
                insert_transaction(&tx, &debtor.id.0, transaction)?;
            }
            match tx.execute(
                "INSERT INTO shop_debtor_refs (shop_id, debtor_id, phone) VALUES (?1, ?2, ?3)",
                rusqlite::params![debtor.shop_id.0, debtor.id.0, debtor.phone.as_str()],
            ) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    let existing =
                        find_ref(&tx, &debtor.shop_id.0, debtor.phone.as_str())?.unwrap_or_default();
                    return Ok(Err(InsertRefusal::DuplicatePhone { existing }));
                }
                Err(e) => return Err(e),
            }

            tx.commit()?;
            Ok(Ok(()))
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        Ok(()) => Ok(()),
        Err(InsertRefusal::MissingShop) => Err(QarzError::shop_not_found(shop_id)),
        Err(InsertRefusal::DuplicatePhone { existing }) => {
            Err(QarzError::DuplicatePhoneInShop { phone, existing })
        }
    }
}

/// Get a debtor by id with its full transaction log.
pub async fn get_debtor(db: &Database, id: &DebtorId) -> Result<Option<Debtor>, QarzError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| load_debtor(conn, &id))
        .await
        .map_err(map_tr_err)
}

/// All debtors of a shop in reference insertion order.
pub async fn list_debtors(db: &Database, shop_id: &ShopId) -> Result<Vec<Debtor>, QarzError> {
    let shop_id = shop_id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Vec<Debtor>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DEBTOR_COLUMNS} FROM shop_debtor_refs r
                 JOIN debtors d ON d.id = r.debtor_id
                 WHERE r.shop_id = ?1
                 ORDER BY r.seq ASC"
            ))?;
            let mut debtors = stmt
                .query_map([&shop_id], row_to_debtor)?
                .collect::<Result<Vec<_>, _>>()?;
            for debtor in &mut debtors {
                debtor.transactions = load_transactions(conn, &debtor.id.0)?;
            }
            Ok(debtors)
        })
        .await
        .map_err(map_tr_err)
}

/// Why an append was refused without writing anything.
enum AppendRefusal {
    MissingDebtor,
    OutOfRange { balance: i64 },
}

/// Append a transaction and move the balance by its signed amount atomically.
///
/// The new balance must stay within [`MAX_AMOUNT`] either way; otherwise the
/// append is refused with `Validation` and nothing is written.
pub async fn append_transaction(
    db: &Database,
    id: &DebtorId,
    transaction: &Transaction,
) -> Result<Debtor, QarzError> {
    let debtor_id = id.0.clone();
    let transaction = transaction.clone();
    let (kind, amount, signed) = (transaction.kind, transaction.amount, transaction.signed_amount());

    let outcome = db
        .connection()
        .call(move |conn| -> Result<Result<Debtor, AppendRefusal>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let Some(balance) = tx
                .query_row(
                    "SELECT debt_amount FROM debtors WHERE id = ?1",
                    [&debtor_id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
            else {
                return Ok(Err(AppendRefusal::MissingDebtor));
            };
            let Some(next) = balance
                .checked_add(signed)
                .filter(|next| (-MAX_AMOUNT..=MAX_AMOUNT).contains(next))
            else {
                return Ok(Err(AppendRefusal::OutOfRange { balance }));
            };

            tx.execute(
                "UPDATE debtors SET debt_amount = ?1 WHERE id = ?2",
                rusqlite::params![next, debtor_id],
            )?;
            insert_transaction(&tx, &debtor_id, &transaction)?;
            tx.commit()?;
            match load_debtor(conn, &debtor_id)? {
                Some(debtor) => Ok(Ok(debtor)),
                None => Ok(Err(AppendRefusal::MissingDebtor)),
            }
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        Ok(debtor) => Ok(debtor),
        Err(AppendRefusal::MissingDebtor) => Err(QarzError::debtor_not_found(id.0.clone())),
        Err(AppendRefusal::OutOfRange { balance }) => Err(QarzError::Validation(format!(
            "a {kind} of {amount} would take the balance of {balance} out of range"
        ))),
    }
}

/// Every debtor record holding this phone, with the owning shop's name.
pub async fn find_debts_by_phone(db: &Database, phone: &Phone) -> Result<Vec<ShopDebt>, QarzError> {
    let phone = phone.as_str().to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<ShopDebt>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT s.name, d.debt_amount FROM debtors d
                 JOIN shops s ON s.id = d.shop_id
                 WHERE d.phone = ?1
                 ORDER BY d.created_at ASC, d.rowid ASC",
            )?;
            let rows = stmt.query_map([&phone], |row| {
                Ok(ShopDebt {
                    shop_name: row.get(0)?,
                    debt_amount: row.get(1)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

fn find_ref(conn: &Connection, shop_id: &str, phone: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT debtor_id FROM shop_debtor_refs WHERE shop_id = ?1 AND phone = ?2",
        [shop_id, phone],
        |row| row.get(0),
    )
    .optional()
}

fn insert_transaction(
    conn: &Connection,
    debtor_id: &str,
    transaction: &Transaction,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO debtor_transactions (debtor_id, kind, amount, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            debtor_id,
            transaction.kind.to_string(),
            transaction.amount,
            transaction.created_at,
        ],
    )?;
    Ok(())
}

fn load_debtor(conn: &Connection, id: &str) -> Result<Option<Debtor>, rusqlite::Error> {
    let debtor = conn
        .query_row(
            &format!("SELECT {DEBTOR_COLUMNS} FROM debtors d WHERE d.id = ?1"),
            [id],
            row_to_debtor,
        )
        .optional()?;
    match debtor {
        Some(mut debtor) => {
            debtor.transactions = load_transactions(conn, id)?;
            Ok(Some(debtor))
        }
        None => Ok(None),
    }
}

fn load_transactions(conn: &Connection, debtor_id: &str) -> Result<Vec<Transaction>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT kind, amount, created_at FROM debtor_transactions
         WHERE debtor_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([debtor_id], |row| {
        let kind: String = row.get(0)?;
        let kind = TransactionKind::from_str(&kind)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
        Ok(Transaction {
            kind,
            amount: row.get(1)?,
            created_at: row.get(2)?,
        })
    })?;
    rows.collect()
}

fn row_to_debtor(row: &rusqlite::Row<'_>) -> Result<Debtor, rusqlite::Error> {
    Ok(Debtor {
        id: DebtorId(row.get(0)?),
        shop_id: ShopId(row.get(1)?),
        name: row.get(2)?,
        nickname: row.get(3)?,
        phone: Phone::from_canonical(row.get(4)?),
        debt_amount: row.get(5)?,
        transactions: Vec::new(),
        created_at: row.get(6)?,
    })
}
