// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed access to persisted dialogue sessions.
//!
//! A session is the serialized [`DialogueState`] of one identity. Absent
//! sessions read as [`DialogueState::Initial`], and saving `Initial` clears
//! the record, so "reset" and "never seen" look the same to the engine.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use qarz_core::time;
use qarz_core::types::SessionRecord;
use qarz_core::{QarzError, SessionStore};
use tracing::warn;

use crate::state::DialogueState;

/// Session persistence with a bounded timeout on every store call.
#[derive(Clone)]
pub struct Sessions {
    store: Arc<dyn SessionStore>,
    timeout: Duration,
}

impl Sessions {
    pub fn new(store: Arc<dyn SessionStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

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

    /// The current state for `identity`, `Initial` if none is stored.
    ///
    /// A record that no longer deserializes (e.g. written by an older
    /// release) is discarded rather than wedging the conversation.
    pub async fn get(&self, identity: &str) -> Result<DialogueState, QarzError> {
        let Some(record) = self.bounded(self.store.get_session(identity)).await? else {
            return Ok(DialogueState::Initial);
        };
        match serde_json::from_str(&record.state) {
            Ok(state) => Ok(state),
            Err(e) => {
                warn!(identity, error = %e, "unreadable session, starting over");
                Ok(DialogueState::Initial)
            }
        }
    }

    /// Replace the stored state for `identity` in one write.
    pub async fn save(&self, identity: &str, state: &DialogueState) -> Result<(), QarzError> {
        if *state == DialogueState::Initial {
            return self.clear(identity).await;
        }
        let record = SessionRecord {
            identity: identity.to_string(),
            state: serde_json::to_string(state)
                .map_err(|e| QarzError::Internal(format!("session serialization failed: {e}")))?,
            updated_at: time::now(),
        };
        self.bounded(self.store.save_session(&record)).await
    }

    /// Reset `identity` to `Initial`.
    pub async fn clear(&self, identity: &str) -> Result<(), QarzError> {
        self.bounded(self.store.clear_session(identity)).await
    }
}
