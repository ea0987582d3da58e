//! Generation-tagged session state.
//!
//! `SessionStore` owns the bundle, context, transcript and banner of the
//! current report generation. Every report generation starts by taking a
//! new `GenerationToken`, which resets all generation-scoped state in one
//! lock acquisition. Writes carry the token they were started under and
//! are dropped when it is no longer current, so a slow earlier generation
//! can never leak into a newer one.
//!
//! Consumers read through `snapshot()`, an immutable copy.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;
use uuid::Uuid;

use crate::types::{
    AnalysisBundle, ChatMessage, ImageHandle, SessionContext, Transcript, VIEW_URL_PREFIX,
};

/// Identifies one report generation. Tokens increase monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationToken(u64);

impl GenerationToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GenerationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// ResourceLedger
// =============================================================================

/// Tracks the image handles whose view URLs are live.
///
/// Only the committed generation's handles are registered; the reset step
/// of the next generation revokes all of them.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    handles: HashMap<Uuid, ImageHandle>,
}

impl ResourceLedger {
    pub fn register(&mut self, handle: ImageHandle) {
        self.handles.insert(handle.id(), handle);
    }

    /// Revoke every registered handle. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let released = self.handles.len();
        self.handles.clear();
        released
    }

    /// Resolve a view URL to its handle, if it has not been revoked.
    pub fn resolve(&self, view_url: &str) -> Option<&ImageHandle> {
        let id = view_url.strip_prefix(VIEW_URL_PREFIX)?;
        let id = Uuid::parse_str(id).ok()?;
        self.handles.get(&id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

// =============================================================================
// SessionStore
// =============================================================================

#[derive(Debug, Default)]
struct SessionState {
    generation: u64,
    bundle: Arc<AnalysisBundle>,
    context: SessionContext,
    transcript: Transcript,
    ledger: ResourceLedger,
    banner: Option<String>,
}

/// Immutable view of the session handed to the rendering surface.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub bundle: Arc<AnalysisBundle>,
    pub context: SessionContext,
    pub transcript: Transcript,
    pub banner: Option<String>,
}

/// Single owner of all generation-scoped state.
#[derive(Debug, Default)]
pub struct SessionStore {
    state: Mutex<SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // State writes are single assignments, so a poisoned lock still guards
    // consistent data.
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a new generation.
    ///
    /// Revokes the previous bundle's handles and clears the bundle, the
    /// context and the transcript before returning the new token.
    pub fn begin_generation(&self) -> GenerationToken {
        let mut state = self.lock();
        state.generation += 1;
        let released = state.ledger.release_all();
        state.bundle = Arc::new(AnalysisBundle::new());
        state.context = SessionContext::default();
        state.transcript = Transcript::new();
        debug!(
            generation = state.generation,
            released_handles = released,
            "Session state reset for new generation"
        );
        GenerationToken(state.generation)
    }

    /// Token of the current generation.
    pub fn current(&self) -> GenerationToken {
        GenerationToken(self.lock().generation)
    }

    pub fn is_current(&self, token: GenerationToken) -> bool {
        self.lock().generation == token.0
    }

    /// Publish a finished generation's bundle and context.
    ///
    /// Returns the published bundle, or `None`, leaving state untouched, if
    /// `token` is stale.
    pub fn commit(
        &self,
        token: GenerationToken,
        bundle: AnalysisBundle,
        context: SessionContext,
    ) -> Option<Arc<AnalysisBundle>> {
        let mut state = self.lock();
        if state.generation != token.0 {
            debug!(
                stale = token.0,
                current = state.generation,
                "Discarding results of a superseded generation"
            );
            return None;
        }
        for (_, handle) in bundle.images() {
            state.ledger.register(handle.clone());
        }
        let bundle = Arc::new(bundle);
        state.bundle = Arc::clone(&bundle);
        state.context = context;
        Some(bundle)
    }

    /// Append a transcript message on behalf of generation `token`.
    ///
    /// Returns `false` if the transcript has since been reset.
    pub fn append_message(&self, token: GenerationToken, message: ChatMessage) -> bool {
        let mut state = self.lock();
        if state.generation != token.0 {
            return false;
        }
        state.transcript.push(message);
        true
    }

    /// Current context together with the generation it belongs to.
    pub fn context(&self) -> (GenerationToken, SessionContext) {
        let state = self.lock();
        (GenerationToken(state.generation), state.context.clone())
    }

    pub fn transcript_len(&self) -> usize {
        self.lock().transcript.len()
    }

    pub fn set_banner(&self, message: impl Into<String>) {
        self.lock().banner = Some(message.into());
    }

    pub fn clear_banner(&self) {
        self.lock().banner = None;
    }

    pub fn banner(&self) -> Option<String> {
        self.lock().banner.clone()
    }

    /// Resolve an image view URL of the current generation.
    pub fn resolve_view_url(&self, view_url: &str) -> Option<ImageHandle> {
        self.lock().ledger.resolve(view_url).cloned()
    }

    /// Number of live image handles.
    pub fn live_handles(&self) -> usize {
        self.lock().ledger.len()
    }

    /// Immutable copy of the whole session.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            generation: state.generation,
            bundle: Arc::clone(&state.bundle),
            context: state.context.clone(),
            transcript: state.transcript.clone(),
            banner: state.banner.clone(),
        }
    }
}
