//! Chat phase state machine.
//!
//! Valid transitions:
//! - NoContext -> Ready (a generation published a complete context)
//! - Ready -> NoContext (a new generation reset the context)
//! - Ready -> Sending (a question was sent)
//! - Sending -> Ready (the exchange settled, whatever its outcome)

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::error::ChatError;

/// Phase of the assistant within the current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatPhase {
    /// The session context is incomplete; questions are refused.
    NoContext,
    /// Ready to accept a question.
    Ready,
    /// A question is awaiting its answer.
    Sending,
}

impl fmt::Display for ChatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatPhase::NoContext => write!(f, "NoContext"),
            ChatPhase::Ready => write!(f, "Ready"),
            ChatPhase::Sending => write!(f, "Sending"),
        }
    }
}

impl ChatPhase {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &ChatPhase) -> bool {
        matches!(
            (self, target),
            (ChatPhase::NoContext, ChatPhase::Ready)
                | (ChatPhase::Ready, ChatPhase::NoContext)
                | (ChatPhase::Ready, ChatPhase::Sending)
                | (ChatPhase::Sending, ChatPhase::Ready)
        )
    }
}

/// Thread-safe holder of the current `ChatPhase`.
#[derive(Debug)]
pub struct PhaseMachine {
    phase: Mutex<ChatPhase>,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseMachine {
    /// Create a machine in `NoContext`.
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(ChatPhase::NoContext),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChatPhase> {
        self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn current(&self) -> ChatPhase {
        *self.lock()
    }

    /// Follow the readiness of the session context. An exchange in flight
    /// is left alone.
    pub fn sync_context(&self, ready: bool) -> ChatPhase {
        let mut phase = self.lock();
        let target = match (*phase, ready) {
            (ChatPhase::NoContext, true) => ChatPhase::Ready,
            (ChatPhase::Ready, false) => ChatPhase::NoContext,
            (current, _) => current,
        };
        if target != *phase {
            advance(&mut phase, target);
        }
        target
    }

    /// Enter `Sending`. The returned guard moves back to `Ready` when dropped,
    /// including when the exchange future is cancelled.
    pub fn begin_send(&self) -> Result<SendGuard<'_>, ChatError> {
        let mut phase = self.lock();
        match *phase {
            ChatPhase::Ready => {
                advance(&mut phase, ChatPhase::Sending);
                Ok(SendGuard { machine: self })
            }
            ChatPhase::Sending => Err(ChatError::Busy),
            ChatPhase::NoContext => Err(ChatError::ContextNotReady),
        }
    }
}

/// Holds the machine in `Sending` for the duration of one exchange.
#[derive(Debug)]
pub struct SendGuard<'a> {
    machine: &'a PhaseMachine,
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        let mut phase = self.machine.lock();
        if *phase == ChatPhase::Sending {
            advance(&mut phase, ChatPhase::Ready);
        }
    }
}

fn advance(phase: &mut ChatPhase, target: ChatPhase) {
    debug_assert!(phase.can_transition_to(&target), "{} -> {}", phase, target);
    debug!("Chat phase: {} -> {}", phase, target);
    *phase = target;
}
