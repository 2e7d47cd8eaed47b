// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shop queries, including the insertion-ordered debtor reference index.

use qarz_core::types::{DebtorId, DebtorRef, Phone, Shop, ShopId};
use qarz_core::QarzError;
use rusqlite::{Connection, OptionalExtension};

use crate::database::{is_unique_violation, map_tr_err, Database};

const SHOP_COLUMNS: &str = "id, name, location, phone, created_at";

/// Insert a new shop. The `phone` column is UNIQUE, so a taken number
/// surfaces as [`QarzError::DuplicatePhone`].
pub async fn insert_shop(db: &Database, shop: &Shop) -> Result<(), QarzError> {
    let shop = shop.clone();
    let phone = shop.phone.to_string();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            match conn.execute(
                "INSERT INTO shops (id, name, location, phone, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    shop.id.0,
                    shop.name,
                    shop.location,
                    shop.phone.as_str(),
                    shop.created_at,
                ],
            ) {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    if inserted {
        Ok(())
    } else {
        Err(QarzError::DuplicatePhone { phone })
    }
}

/// Get a shop by id, with its debtor references.
pub async fn get_shop(db: &Database, id: &ShopId) -> Result<Option<Shop>, QarzError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            load_shop(
                conn,
                &format!("SELECT {SHOP_COLUMNS} FROM shops WHERE id = ?1"),
                &id,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Find the shop registered under a phone number.
pub async fn find_shop_by_phone(db: &Database, phone: &Phone) -> Result<Option<Shop>, QarzError> {
    let phone = phone.as_str().to_string();
    db.connection()
        .call(move |conn| {
            load_shop(
                conn,
                &format!("SELECT {SHOP_COLUMNS} FROM shops WHERE phone = ?1"),
                &phone,
            )
        })
        .await
        .map_err(map_tr_err)
}

fn load_shop(conn: &Connection, sql: &str, key: &str) -> Result<Option<Shop>, rusqlite::Error> {
    let shop = conn
        .query_row(sql, [key], |row| {
            Ok(Shop {
                id: ShopId(row.get(0)?),
                name: row.get(1)?,
                location: row.get(2)?,
                phone: Phone::from_canonical(row.get(3)?),
                debtors: Vec::new(),
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    match shop {
        Some(mut shop) => {
            shop.debtors = load_refs(conn, &shop.id.0)?;
            Ok(Some(shop))
        }
        None => Ok(None),
    }
}

/// Debtor references of a shop, oldest first.
pub(crate) fn load_refs(conn: &Connection, shop_id: &str) -> Result<Vec<DebtorRef>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT debtor_id, phone FROM shop_debtor_refs WHERE shop_id = ?1 ORDER BY seq ASC",
    )?;
    let rows = stmt.query_map([shop_id], |row| {
        Ok(DebtorRef {
            debtor_id: DebtorId(row.get(0)?),
            phone: Phone::from_canonical(row.get(1)?),
        })
    })?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_shop(id: &str, phone: &str) -> Shop {
        Shop {
            id: ShopId(id.to_string()),
            name: "Baraka".to_string(),
            location: "Chorsu bazaar".to_string(),
            phone: Phone::from_canonical(phone.to_string()),
            debtors: Vec::new(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_and_get_shop() {
        let db = Database::open_in_memory().await.unwrap();
        let shop = sample_shop("s1", "+998900000001");
        insert_shop(&db, &shop).await.unwrap();

        let fetched = get_shop(&db, &shop.id).await.unwrap().unwrap();
        assert_eq!(fetched, shop);
        assert!(fetched.debtors.is_empty());
    }

    #[tokio::test]
    async fn find_by_phone_hits_and_misses() {
        let db = Database::open_in_memory().await.unwrap();
        insert_shop(&db, &sample_shop("s1", "+998900000001")).await.unwrap();

        let hit = find_shop_by_phone(&db, &Phone::from_canonical("+998900000001".into()))
            .await
            .unwrap();
        assert_eq!(hit.map(|s| s.id.0), Some("s1".to_string()));

        let miss = find_shop_by_phone(&db, &Phone::from_canonical("+998900000002".into()))
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn duplicate_phone_is_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        insert_shop(&db, &sample_shop("s1", "+998900000001")).await.unwrap();

        let err = insert_shop(&db, &sample_shop("s2", "+998900000001"))
            .await
            .unwrap_err();
        assert!(matches!(err, QarzError::DuplicatePhone { .. }));
        assert!(get_shop(&db, &ShopId("s2".into())).await.unwrap().is_none());
    }
}
