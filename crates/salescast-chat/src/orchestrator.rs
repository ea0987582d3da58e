//! Conversational assistant over the current report.
//!
//! A question is only sent once the session context is complete. The user
//! message is appended before the round trip; the answer, or a failure
//! message, is appended after it. Both appends carry the generation token
//! read at the start, so an exchange overtaken by a new report leaves the
//! new transcript untouched.

use std::sync::Arc;

use tracing::{debug, info, warn};

use salescast_client::{AskRequest, ForecastApi};
use salescast_core::config::ChatConfig;
use salescast_core::session::{GenerationToken, SessionStore};
use salescast_core::types::{ChatMessage, SessionContext};

use crate::error::ChatError;
use crate::state::{ChatPhase, PhaseMachine};

pub const CONTEXT_NOT_READY: &str = "The AI context is not ready yet. Please wait a moment after generating the report and try again.";

pub const UNABLE_TO_ANSWER: &str = "Sorry, I'm unable to answer that right now.";

/// Sends questions about the current report to the assistant.
pub struct ChatOrchestrator {
    api: Arc<dyn ForecastApi>,
    store: Arc<SessionStore>,
    config: ChatConfig,
    phase: PhaseMachine,
}

impl ChatOrchestrator {
    pub fn new(api: Arc<dyn ForecastApi>, store: Arc<SessionStore>, config: ChatConfig) -> Self {
        Self {
            api,
            store,
            config,
            phase: PhaseMachine::new(),
        }
    }

    /// Current phase, following the readiness of the session context.
    pub fn state(&self) -> ChatPhase {
        let (_, context) = self.store.context();
        self.phase.sync_context(context.ready())
    }

    /// Ask one question.
    ///
    /// Returns `Ok(None)` for a blank question, or when the answer arrived
    /// after a new report replaced the transcript. Otherwise returns the
    /// assistant message appended to the transcript; a failed service call
    /// is such a message, not an error.
    pub async fn ask(&self, question: &str) -> Result<Option<ChatMessage>, ChatError> {
        if question.trim().is_empty() {
            return Ok(None);
        }
        if !self.config.enabled {
            return Err(ChatError::Disabled);
        }
        if question.chars().count() > self.config.max_question_length {
            return Err(ChatError::QuestionTooLong(self.config.max_question_length));
        }

        let (token, context) = self.store.context();
        if self.phase.sync_context(context.ready()) == ChatPhase::Sending {
            return Err(ChatError::Busy);
        }
        self.store.clear_banner();
        if !context.ready() {
            info!(missing = ?context.missing(), "Question refused: context not ready");
            self.store.set_banner(CONTEXT_NOT_READY);
            return Err(ChatError::ContextNotReady);
        }

        let _sending = self.phase.begin_send()?;
        Ok(self.exchange(token, context, question).await)
    }

    /// One round trip on behalf of generation `token`. Nothing is sent when
    /// the question cannot be recorded under that generation.
    async fn exchange(
        &self,
        token: GenerationToken,
        context: SessionContext,
        question: &str,
    ) -> Option<ChatMessage> {
        if !self.store.append_message(token, ChatMessage::user(question)) {
            debug!(generation = %token, "Question dropped: generation superseded");
            return None;
        }
        debug!(generation = %token, chars = question.chars().count(), "Question sent");

        let request = AskRequest::new(question, context);
        let reply = match self.api.ask(&request).await {
            Ok(answer) => ChatMessage::assistant(answer),
            Err(err) => {
                warn!(error = %err, "Assistant request failed");
                ChatMessage::assistant(format!(
                    "{} AI API Error: {}",
                    UNABLE_TO_ANSWER,
                    err.detail()
                ))
            }
        };

        if self.store.append_message(token, reply.clone()) {
            Some(reply)
        } else {
            debug!(generation = %token, "Discarding answer for a superseded generation");
            None
        }
    }
}
