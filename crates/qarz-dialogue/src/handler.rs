// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs one inbound event through the engine against the real ledger.
//!
//! Order per event: load session, step, execute each requested effect and
//! resume, save the next state, send the prompt. The prompt is only sent
//! once the state it describes is stored. Transient store failures reply
//! with a "try later" prompt and leave the session where it was.

use std::sync::Arc;

use qarz_config::model::QarzConfig;
use qarz_core::types::{InboundMessage, OutboundMessage, Prompt};
use qarz_core::{ChannelAdapter, QarzError};
use qarz_ledger::Ledger;
use tracing::{debug, error, warn};

use crate::engine::{Engine, Step, Transition};
use crate::session::Sessions;
use crate::state::DialogueState;

/// Processes inbound events for any identity.
///
/// Callers must not run two events for the same identity concurrently;
/// [`DialogueLoop`](crate::DialogueLoop) serializes them.
pub struct DialogueHandler {
    engine: Engine,
    ledger: Ledger,
    sessions: Sessions,
    channel: Arc<dyn ChannelAdapter>,
    max_effect_chain: usize,
}

impl DialogueHandler {
    pub fn new(
        engine: Engine,
        ledger: Ledger,
        sessions: Sessions,
        channel: Arc<dyn ChannelAdapter>,
        max_effect_chain: usize,
    ) -> Self {
        Self {
            engine,
            ledger,
            sessions,
            channel,
            max_effect_chain,
        }
    }

    /// Wire a handler from configuration and already-initialized stores.
    pub fn from_config(
        config: &QarzConfig,
        ledger: Ledger,
        sessions: Sessions,
        channel: Arc<dyn ChannelAdapter>,
    ) -> Result<Self, QarzError> {
        Ok(Self::new(
            Engine::from_config(config)?,
            ledger,
            sessions,
            channel,
            config.dialogue.max_effect_chain,
        ))
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    /// Handle one event to completion.
    ///
    /// Only a failure to deliver the reply is returned; every other failure
    /// is turned into a "try later" prompt for the user.
    pub async fn handle(&self, msg: InboundMessage) -> Result<(), QarzError> {
        let identity = msg.identity.as_str();

        let state = match self.sessions.get(identity).await {
            Ok(state) => state,
            Err(e) => {
                error!(identity, error = %e, "failed to load session");
                return self.reply(&msg.chat_id, self.engine.prompts().try_later()).await;
            }
        };

        let mut committed = false;
        let transition = match self.advance(&state, &msg, &mut committed).await {
            Ok(transition) => transition,
            Err(e) => {
                if committed {
                    warn!(
                        identity,
                        state = state.name(),
                        error = %e,
                        "ledger change committed but the dialogue could not finish"
                    );
                } else if e.is_transient() {
                    warn!(identity, state = state.name(), error = %e, "store unavailable");
                } else {
                    error!(identity, state = state.name(), error = %e, "dialogue step failed");
                }
                return self.reply(&msg.chat_id, self.engine.prompts().try_later()).await;
            }
        };

        if let Err(e) = self.sessions.save(identity, &transition.next).await {
            if committed {
                // A replay of this event may apply the ledger change again.
                warn!(
                    identity,
                    next = transition.next.name(),
                    error = %e,
                    "ledger change committed but session write failed"
                );
            } else {
                error!(identity, next = transition.next.name(), error = %e, "failed to save session");
            }
            return self.reply(&msg.chat_id, self.engine.prompts().try_later()).await;
        }

        debug!(
            identity,
            from = state.name(),
            to = transition.next.name(),
            "dialogue advanced"
        );
        self.reply(&msg.chat_id, transition.prompt).await
    }

    /// Step the engine and run effects until it settles on a transition.
    async fn advance(
        &self,
        state: &DialogueState,
        msg: &InboundMessage,
        committed: &mut bool,
    ) -> Result<Transition, QarzError> {
        let mut step = self.engine.step(state, &msg.event, &msg.identity);
        let mut effects = 0;
        loop {
            match step {
                Step::Done(transition) => return Ok(transition),
                Step::Run { effect, then } => {
                    effects += 1;
                    if effects > self.max_effect_chain {
                        return Err(QarzError::Internal(format!(
                            "effect chain exceeded {} effects in state {}",
                            self.max_effect_chain,
                            state.name()
                        )));
                    }
                    let name = effect.name();
                    let mutation = effect.is_mutation();
                    let outcome = effect.execute(&self.ledger).await?;
                    *committed |= mutation && !outcome.is_refusal();
                    debug!(identity = %msg.identity, effect = name, "effect completed");
                    step = self.engine.resume(then, outcome)?;
                }
            }
        }
    }

    async fn reply(&self, chat_id: &str, prompt: Prompt) -> Result<(), QarzError> {
        self.channel
            .send(OutboundMessage {
                chat_id: chat_id.to_string(),
                prompt,
            })
            .await
            .map(|_| ())
    }
}
