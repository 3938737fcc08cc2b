//! Editor-session wrapper around the active-suggestion cursor.
//!
//! The cursor itself (`redline-core::active`) is synchronous; this wrapper
//! owns the two async edges: the best-effort server-side delete when a
//! suggestion is resolved, and the cosmetic auto-advance delay. A pending
//! advance is both aborted (timer cancelled) and generation-checked
//! (a late commit is a no-op), so a manual navigation during the delay
//! window always wins.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

use redline_core::active::{ActiveSuggestionManager, Resolution};
use redline_core::types::{ActiveSuggestionState, Suggestion};

use crate::config::EngineConfig;
use crate::remote::{AnalysisService, AuthTokenProvider};

/// One writer's review session over a single post.
pub struct EditorSession {
    cursor: Arc<Mutex<ActiveSuggestionManager>>,
    auth: Arc<dyn AuthTokenProvider>,
    analysis: Arc<dyn AnalysisService>,
    advance_delay: Duration,
    pending_timer: Mutex<Option<JoinHandle<()>>>,
}

impl EditorSession {
    pub fn new(
        auth: Arc<dyn AuthTokenProvider>,
        analysis: Arc<dyn AnalysisService>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            cursor: Arc::new(Mutex::new(ActiveSuggestionManager::new())),
            auth,
            analysis,
            advance_delay: config.active.auto_advance_delay(),
            pending_timer: Mutex::new(None),
        }
    }

    /// Snapshot for the rendering layer.
    pub fn state(&self) -> ActiveSuggestionState {
        self.lock_cursor().state()
    }

    /// Resyncs the cursor after the suggestion set changed externally
    /// (recalculation, fresh fetch). Cancels any pending auto-advance.
    pub fn sync_suggestions(&self, suggestions: &[Suggestion]) {
        self.cancel_pending_timer();
        self.lock_cursor().sync_suggestions(suggestions);
    }

    /// Restarts the session with a full suggestion list.
    pub fn reset(&self, suggestions: &[Suggestion]) {
        self.cancel_pending_timer();
        self.lock_cursor().reset(suggestions);
    }

    pub fn navigate_next(&self) -> bool {
        self.cancel_pending_timer();
        self.lock_cursor().navigate_next()
    }

    pub fn navigate_previous(&self) -> bool {
        self.cancel_pending_timer();
        self.lock_cursor().navigate_previous()
    }

    pub fn navigate_to_index(&self, index: usize) -> bool {
        self.cancel_pending_timer();
        self.lock_cursor().navigate_to_index(index)
    }

    /// Resolves a suggestion the writer accepted or rejected.
    ///
    /// The server-side delete is best-effort: a failure is logged and the
    /// local resolution proceeds regardless. When auto-advance is
    /// requested, the cursor switches to the replacement only after the
    /// configured feedback delay — and only if nothing superseded it.
    pub async fn resolve_suggestion(&self, suggestion_id: &str, auto_advance: bool) -> Resolution {
        self.delete_remote(suggestion_id).await;

        let resolution = self
            .lock_cursor()
            .resolve(suggestion_id, auto_advance);

        if let Some(pending) = &resolution.pending {
            self.cancel_pending_timer();
            let cursor = Arc::clone(&self.cursor);
            let generation = pending.generation;
            let delay = self.advance_delay;
            let timer = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let mut cursor = cursor.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                cursor.commit_pending_advance(generation);
            });
            *self
                .pending_timer
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(timer);
        }

        resolution
    }

    async fn delete_remote(&self, suggestion_id: &str) {
        let token = match self.auth.get_auth_token().await {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(suggestion_id, %err, "auth token unavailable, skipping remote delete");
                return;
            }
        };
        if let Err(err) = self.analysis.delete_suggestion(&token, suggestion_id).await {
            tracing::warn!(suggestion_id, %err, "remote suggestion delete failed");
        }
    }

    fn cancel_pending_timer(&self) {
        let timer = self
            .pending_timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(timer) = timer {
            timer.abort();
        }
    }

    fn lock_cursor(&self) -> MutexGuard<'_, ActiveSuggestionManager> {
        self.cursor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
