//! Edit ↔ Review mode transition sequencing.
//!
//! The manager is the single entry point the UI calls when the writer
//! toggles modes. It debounces rapid toggles, enforces single-flight,
//! reports phase progress on the bus, runs the recalculation for
//! Edit→Review, caches successful outcomes, and — critically — never lets
//! a recalculation failure block the mode switch itself: remote failures
//! degrade freshness, they do not fail the transition.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::mpsc;

use redline_core::cache::LruTtlCache;
use redline_core::types::Suggestion;

use crate::cancel::CancelToken;
use crate::config::{EngineConfig, TransitionConfig};
use crate::event::{ProgressBus, TransitionPhase, TransitionProgress};
use crate::service::SuggestionRecalculationService;

/// The two user-visible editor modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// Free text editing.
    Edit,
    /// Suggestion inspection.
    Review,
}

/// Everything the manager needs to execute one transition.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub from: EditorMode,
    pub to: EditorMode,
    pub post_id: String,
    /// Content as it stands right now.
    pub content: String,
    /// Content snapshot taken when Review mode was last entered.
    pub content_at_last_review: String,
    /// The suggestion set currently held by the UI.
    pub suggestions: Vec<Suggestion>,
}

/// Why a successful transition carries stale suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    /// The analysis service was unreachable.
    Offline,
    /// The service responded but the update could not be completed.
    UpdateFailed,
}

impl Degradation {
    /// User-facing explanation supplied to the rendering layer.
    pub fn message(&self) -> &'static str {
        match self {
            Degradation::Offline => "Offline — showing existing suggestions",
            Degradation::UpdateFailed => {
                "Suggestion update failed — existing suggestions are still usable"
            }
        }
    }
}

/// Fatal transition failures. Everything else degrades instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("another transition is already in flight")]
    AlreadyInFlight,
    #[error("superseded by a newer transition request")]
    Superseded,
    #[error("transition cancelled")]
    Cancelled,
}

impl TransitionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransitionError::AlreadyInFlight | TransitionError::Cancelled)
    }

    pub fn requires_user_action(&self) -> bool {
        matches!(self, TransitionError::Cancelled)
    }
}

/// Outcome handed back to the UI after a transition attempt.
#[derive(Debug, Clone)]
pub struct TransitionResult {
    pub success: bool,
    /// The mode in effect after this attempt.
    pub mode: EditorMode,
    /// Present on successful Edit→Review transitions: survivors plus any
    /// freshly fetched suggestions.
    pub updated_suggestions: Option<Vec<Suggestion>>,
    pub degradation: Option<Degradation>,
    pub error: Option<TransitionError>,
    pub retryable: bool,
    pub requires_user_action: bool,
}

impl TransitionResult {
    fn succeeded(mode: EditorMode, suggestions: Option<Vec<Suggestion>>) -> Self {
        Self {
            success: true,
            mode,
            updated_suggestions: suggestions,
            degradation: None,
            error: None,
            retryable: false,
            requires_user_action: false,
        }
    }

    fn failed(request: &TransitionRequest, error: TransitionError) -> Self {
        Self {
            success: false,
            // A failed transition leaves the editor where it was.
            mode: request.from,
            updated_suggestions: None,
            degradation: None,
            error: Some(error),
            retryable: error.is_retryable(),
            requires_user_action: error.requires_user_action(),
        }
    }
}

/// Cached payload of a completed, non-degraded Edit→Review transition.
#[derive(Debug, Clone)]
struct CachedOutcome {
    suggestions: Vec<Suggestion>,
}

/// Sequences mode transitions for one editor session.
pub struct ModeTransitionManager {
    service: tokio::sync::Mutex<SuggestionRecalculationService>,
    progress: ProgressBus,
    config: TransitionConfig,
    in_flight: AtomicBool,
    latest_request: AtomicU64,
    outcome_cache: Mutex<LruTtlCache<String, CachedOutcome>>,
}

impl ModeTransitionManager {
    pub fn new(service: SuggestionRecalculationService, config: &EngineConfig) -> Self {
        Self {
            service: tokio::sync::Mutex::new(service),
            progress: ProgressBus::new(),
            config: config.transition.clone(),
            in_flight: AtomicBool::new(false),
            latest_request: AtomicU64::new(0),
            outcome_cache: Mutex::new(LruTtlCache::new(
                config.transition.cache_capacity,
                config.transition.cache_ttl(),
            )),
        }
    }

    /// Subscribes to phase progress; drop the receiver to unsubscribe.
    pub fn subscribe_progress(&self) -> mpsc::UnboundedReceiver<TransitionProgress> {
        self.progress.subscribe()
    }

    /// Executes (or rejects) one mode transition.
    ///
    /// Rapid repeated calls within the debounce window collapse: only the
    /// last one proceeds, earlier ones resolve as superseded. While a
    /// transition is executing, further requests are rejected as
    /// already-in-flight rather than queued.
    pub async fn transition(
        &self,
        request: TransitionRequest,
        cancel: &CancelToken,
    ) -> TransitionResult {
        // Debounce: claim a sequence number, sit out the window, and only
        // proceed when no newer request arrived meanwhile.
        let seq = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.config.debounce()).await;
        if self.latest_request.load(Ordering::SeqCst) != seq {
            tracing::debug!(post_id = %request.post_id, "transition superseded in debounce window");
            return TransitionResult::failed(&request, TransitionError::Superseded);
        }

        // Single-flight: one transition at a time per manager.
        let guard = match InFlightGuard::acquire(&self.in_flight) {
            Some(guard) => guard,
            None => {
                let result = TransitionResult::failed(&request, TransitionError::AlreadyInFlight);
                self.emit_error(&request, "A transition is already running");
                return result;
            }
        };

        let transition_id = uuid::Uuid::new_v4().to_string();
        let result = self.run(&transition_id, &request, cancel).await;
        drop(guard);
        result
    }

    async fn run(
        &self,
        transition_id: &str,
        request: &TransitionRequest,
        cancel: &CancelToken,
    ) -> TransitionResult {
        self.emit(transition_id, TransitionPhase::Starting, "Preparing transition", 0, true);

        if cancel.is_cancelled() {
            self.emit_error(request, "Transition cancelled");
            return TransitionResult::failed(request, TransitionError::Cancelled);
        }

        match request.to {
            EditorMode::Edit => self.run_to_edit(transition_id, request, cancel).await,
            EditorMode::Review => self.run_to_review(transition_id, request, cancel).await,
        }
    }

    /// Review→Edit: no recalculation, a short cosmetic delay only.
    async fn run_to_edit(
        &self,
        transition_id: &str,
        request: &TransitionRequest,
        cancel: &CancelToken,
    ) -> TransitionResult {
        self.emit(transition_id, TransitionPhase::Updating, "Returning to editing", 70, true);
        tokio::select! {
            () = tokio::time::sleep(self.config.edit_return_delay()) => {}
            () = cancel.cancelled() => {
                self.emit_error(request, "Transition cancelled");
                return TransitionResult::failed(request, TransitionError::Cancelled);
            }
        }
        self.emit(transition_id, TransitionPhase::Completing, "Edit mode ready", 100, false);
        TransitionResult::succeeded(EditorMode::Edit, None)
    }

    /// Edit→Review: recalculate when the content moved since the last
    /// review, consulting the outcome cache first.
    async fn run_to_review(
        &self,
        transition_id: &str,
        request: &TransitionRequest,
        cancel: &CancelToken,
    ) -> TransitionResult {
        if request.content == request.content_at_last_review {
            // Nothing changed since the last review pass.
            self.emit(transition_id, TransitionPhase::Completing, "Review mode ready", 100, false);
            return TransitionResult::succeeded(
                EditorMode::Review,
                Some(request.suggestions.clone()),
            );
        }

        let key = transition_key(request);
        let cached = {
            let mut cache = self
                .outcome_cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            cache.get(&key)
        };
        if let Some(outcome) = cached {
            tracing::debug!(post_id = %request.post_id, "transition outcome served from cache");
            self.emit(transition_id, TransitionPhase::Completing, "Review mode ready", 100, false);
            return TransitionResult::succeeded(EditorMode::Review, Some(outcome.suggestions));
        }

        self.emit(
            transition_id,
            TransitionPhase::Recalculating,
            "Updating suggestion positions",
            30,
            true,
        );

        let mut service = self.service.lock().await;
        let outcome = tokio::select! {
            outcome = service.perform_recalculation(
                &request.content_at_last_review,
                &request.content,
                &request.suggestions,
                &request.post_id,
                cancel,
            ) => outcome,
            () = cancel.cancelled() => {
                self.emit_error(request, "Transition cancelled");
                return TransitionResult::failed(request, TransitionError::Cancelled);
            }
        };
        drop(service);

        self.emit(transition_id, TransitionPhase::Updating, "Applying suggestions", 70, false);

        let mut suggestions = outcome.result.updated_suggestions.clone();
        suggestions.extend(outcome.result.new_suggestions.clone());

        let degradation = outcome.remote_failure.as_ref().map(|err| {
            if err.is_network_like() {
                Degradation::Offline
            } else {
                Degradation::UpdateFailed
            }
        });

        // Only clean outcomes are cached: a degraded pass should retry its
        // remote leg on the next toggle instead of replaying staleness.
        if degradation.is_none() {
            let mut cache = self
                .outcome_cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            cache.insert(key, CachedOutcome { suggestions: suggestions.clone() });
        }

        self.emit(transition_id, TransitionPhase::Completing, "Review mode ready", 100, false);

        let mut result = TransitionResult::succeeded(EditorMode::Review, Some(suggestions));
        result.degradation = degradation;
        result
    }

    fn emit(
        &self,
        transition_id: &str,
        phase: TransitionPhase,
        message: &str,
        percent: u8,
        cancellable: bool,
    ) {
        self.progress.emit(&TransitionProgress {
            transition_id: transition_id.to_owned(),
            phase,
            message: message.to_owned(),
            percent,
            cancellable,
        });
    }

    fn emit_error(&self, request: &TransitionRequest, message: &str) {
        tracing::debug!(post_id = %request.post_id, message, "transition failed");
        self.progress.emit(&TransitionProgress {
            transition_id: String::new(),
            phase: TransitionPhase::Error,
            message: message.to_owned(),
            percent: 100,
            cancellable: false,
        });
    }
}

/// RAII guard for the single-flight flag.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Composite cache key for a whole-transition outcome.
fn transition_key(request: &TransitionRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update([mode_tag(request.from), mode_tag(request.to)]);
    hasher.update(request.post_id.as_bytes());
    hasher.update(b"\x00");
    hasher.update(request.content.as_bytes());
    hasher.update(b"\x00");
    hasher.update(request.content_at_last_review.as_bytes());
    hasher.update(b"\x00");
    let mut ids: Vec<&str> = request.suggestions.iter().map(|s| s.id.as_str()).collect();
    ids.sort_unstable();
    for id in ids {
        hasher.update(id.as_bytes());
        hasher.update(b"\x01");
    }
    hex::encode(hasher.finalize())
}

fn mode_tag(mode: EditorMode) -> u8 {
    match mode {
        EditorMode::Edit => 0,
        EditorMode::Review => 1,
    }
}
