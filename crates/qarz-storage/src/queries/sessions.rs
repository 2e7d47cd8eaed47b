// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialogue session queries: one row per end-user identity.

use qarz_core::types::SessionRecord;
use qarz_core::QarzError;
use rusqlite::OptionalExtension;

use crate::database::{map_tr_err, Database};

/// Get the stored session for an identity, if any.
pub async fn get_session(db: &Database, identity: &str) -> Result<Option<SessionRecord>, QarzError> {
    let identity = identity.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<SessionRecord>, rusqlite::Error> {
            conn.query_row(
                "SELECT identity, state, updated_at FROM dialogue_sessions WHERE identity = ?1",
                [&identity],
                |row| {
                    Ok(SessionRecord {
                        identity: row.get(0)?,
                        state: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Replace the session for an identity in a single statement.
pub async fn save_session(db: &Database, record: &SessionRecord) -> Result<(), QarzError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO dialogue_sessions (identity, state, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(identity) DO UPDATE
                 SET state = excluded.state, updated_at = excluded.updated_at",
                rusqlite::params![record.identity, record.state, record.updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Remove the session for an identity. Missing sessions are not an error.
pub async fn clear_session(db: &Database, identity: &str) -> Result<(), QarzError> {
    let identity = identity.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute("DELETE FROM dialogue_sessions WHERE identity = ?1", [&identity])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
