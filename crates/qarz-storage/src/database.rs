// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread: `Database` wraps exactly one connection and every query module
//! goes through [`Database::connection`]. Each ledger mutation runs inside
//! one SQLite transaction on that thread, which is what makes balance
//! updates and reference appends atomic.

use std::path::Path;

use qarz_core::QarzError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

/// Owned handle to the single SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database, apply PRAGMAs, and run migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, QarzError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| QarzError::Storage {
                    source: Box::new(e),
                })?;
        }

        let conn = Connection::open(path).await.map_err(|e| map_tr_err(tokio_rusqlite::Error::Error(e)))?;
        Self::prepare(conn, wal_mode).await
    }

    /// Open a private in-memory database (tests and one-off tooling).
    pub async fn open_in_memory() -> Result<Self, QarzError> {
        let conn = Connection::open_in_memory().await.map_err(|e| map_tr_err(tokio_rusqlite::Error::Error(e)))?;
        Self::prepare(conn, false).await
    }

    async fn prepare(conn: Connection, wal_mode: bool) -> Result<Self, QarzError> {
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get(0)
                })?;
                debug!(%mode, "journal mode set");
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(migrations::run_migrations)
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(inner) => inner,
                other => QarzError::Storage {
                    source: other.to_string().into(),
                },
            })?;

        debug!(wal_mode, "database ready");
        Ok(Self { conn })
    }

    /// The single connection all queries run through.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), QarzError> {
        checkpoint(&self.conn).await?;
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Truncate the WAL into the main database file.
pub(crate) async fn checkpoint(conn: &Connection) -> Result<(), QarzError> {
    conn.call(|conn| -> Result<(), rusqlite::Error> {
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)
}

/// Convert a tokio-rusqlite error into `QarzError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> QarzError {
    QarzError::Storage {
        source: Box::new(e),
    }
}

/// Whether a rusqlite error is a UNIQUE / PRIMARY KEY violation.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
