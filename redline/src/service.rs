//! End-to-end suggestion recalculation.
//!
//! Sequences the core engine for one edit window: diff the two content
//! versions, run (or replay from cache) the offset deltas, shift the
//! survivors, drop destroyed anchors, and — best effort — ask the analysis
//! service for fresh suggestions covering the changed text. Local offset
//! work always completes; remote failures only cost freshness and are
//! reported as a degradation, never as an error.

use std::sync::Arc;

use redline_core::cache::{CacheMetrics, RecalculationCache};
use redline_core::delta::calculate_deltas;
use redline_core::diff::DiffCalculator;
use redline_core::text;
use redline_core::types::{
    ChangedRange, ContentDiff, RecalculationResult, Suggestion, SuggestionDelta,
};

use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::remote::{AnalysisService, AuthTokenProvider, RemoteError, ReviewMessage};
use crate::retry::{self, RetryPolicy};

/// A recalculation plus the freshness status of its remote leg.
#[derive(Debug)]
pub struct RecalculationOutcome {
    pub result: RecalculationResult,
    /// Present when the best-effort new-suggestion request failed; the
    /// local offset work in `result` is still complete and correct.
    pub remote_failure: Option<RemoteError>,
}

/// Orchestrates diff → deltas → update → invalidate → fetch for one post.
///
/// One instance per open document; owns the delta cache. Single-flight by
/// construction — the owning transition manager serialises calls.
pub struct SuggestionRecalculationService {
    auth: Arc<dyn AuthTokenProvider>,
    analysis: Arc<dyn AnalysisService>,
    diff_calculator: DiffCalculator,
    cache: RecalculationCache,
    config: crate::config::RecalculationConfig,
    retry_policy: RetryPolicy,
}

impl SuggestionRecalculationService {
    pub fn new(
        auth: Arc<dyn AuthTokenProvider>,
        analysis: Arc<dyn AnalysisService>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            auth,
            analysis,
            diff_calculator: DiffCalculator::with_line_threshold(
                config.recalculation.line_diff_threshold,
            ),
            cache: RecalculationCache::new(config.cache.capacity, config.cache.ttl()),
            config: config.recalculation.clone(),
            retry_policy: config.retry.policy(),
        }
    }

    /// Cache counters for observability and tests.
    pub fn cache_metrics(&self) -> CacheMetrics {
        self.cache.metrics()
    }

    /// Recalculates `current_suggestions` for the edit that turned
    /// `old_content` into `new_content`.
    ///
    /// Guarantee: every suggestion in `result.updated_suggestions` anchors
    /// in `new_content` — a suggestion that cannot be placed exactly is
    /// dropped and counted, never rendered at a wrong position. `cancel`
    /// aborts the remote leg only; local work is synchronous and always
    /// finishes.
    pub async fn perform_recalculation(
        &mut self,
        old_content: &str,
        new_content: &str,
        current_suggestions: &[Suggestion],
        post_id: &str,
        cancel: &CancelToken,
    ) -> RecalculationOutcome {
        // Identical content short-circuits: no diff, no cache entry, the
        // survivors are just re-validated.
        let diffs = self.diff_calculator.diff(old_content, new_content);
        if diffs.is_empty() {
            let (updated, invalidated) = split_by_anchor(current_suggestions, new_content);
            return RecalculationOutcome {
                result: RecalculationResult {
                    updated_suggestions: updated,
                    invalidated_suggestions: invalidated,
                    new_suggestions: Vec::new(),
                    changed_ranges: Vec::new(),
                },
                remote_failure: None,
            };
        }

        let deltas = self.deltas_for(new_content, current_suggestions, &diffs);
        let (mut updated, mut invalidated) = self.apply_deltas(current_suggestions, &deltas);

        let changed_ranges = self.changed_ranges(&diffs);
        if self.config.enable_invalidation {
            // A position update can move a previously-safe suggestion into
            // the rewritten region; re-check survivors that moved.
            let (kept, moved_into_change): (Vec<_>, Vec<_>) =
                updated.into_iter().partition(|s| {
                    !changed_ranges
                        .iter()
                        .any(|r| r.overlaps(s.start_offset, s.end_offset))
                });
            invalidated.extend(moved_into_change.into_iter().map(|s| s.id));
            updated = kept;
        }

        // Final anchor guarantee, independent of the step toggles.
        let (updated, stale) = split_by_anchor(&updated, new_content);
        invalidated.extend(stale);

        tracing::debug!(
            post_id,
            surviving = updated.len(),
            invalidated = invalidated.len(),
            "recalculation offsets settled"
        );

        let (new_suggestions, remote_failure) = if self.should_request_analysis(&changed_ranges) {
            match self
                .request_new_suggestions(post_id, new_content, &updated, cancel)
                .await
            {
                Ok(fresh) => (fresh, None),
                Err(err) => {
                    tracing::warn!(post_id, %err, "new-suggestion request failed; keeping local result");
                    (Vec::new(), Some(err))
                }
            }
        } else {
            (Vec::new(), None)
        };

        RecalculationOutcome {
            result: RecalculationResult {
                updated_suggestions: updated,
                invalidated_suggestions: invalidated,
                new_suggestions,
                changed_ranges,
            },
            remote_failure,
        }
    }

    /// Deltas through the cache: consulted before computation, populated
    /// only after, so hit and miss paths return identical values.
    fn deltas_for(
        &mut self,
        new_content: &str,
        suggestions: &[Suggestion],
        diffs: &[ContentDiff],
    ) -> Vec<SuggestionDelta> {
        let ids: Vec<&str> = suggestions.iter().map(|s| s.id.as_str()).collect();
        if let Some(cached) = self.cache.get(new_content, &ids, diffs) {
            return cached;
        }
        let computed = calculate_deltas(diffs, suggestions);
        self.cache.set(new_content, &ids, diffs, computed.clone());
        computed
    }

    /// Applies deltas per the step toggles, splitting into (survivors,
    /// invalidated ids).
    fn apply_deltas(
        &self,
        suggestions: &[Suggestion],
        deltas: &[SuggestionDelta],
    ) -> (Vec<Suggestion>, Vec<String>) {
        let mut updated = Vec::with_capacity(suggestions.len());
        let mut invalidated = Vec::new();

        for suggestion in suggestions {
            // Deltas are matched by id, not position: a cache replay may
            // carry them in a different order than this suggestion list.
            let delta = deltas.iter().find(|d| d.suggestion_id == suggestion.id);
            let Some(delta) = delta else {
                // No delta for a suggestion is itself a signal: treat as
                // invalidated rather than guessing at offsets.
                invalidated.push(suggestion.id.clone());
                continue;
            };
            if self.config.enable_invalidation && !delta.is_valid {
                invalidated.push(suggestion.id.clone());
                continue;
            }
            let mut survivor = suggestion.clone();
            if self.config.enable_position_updates && delta.is_valid && delta.requires_update {
                survivor.start_offset = delta.new_start_offset;
                survivor.end_offset = delta.new_end_offset;
            }
            updated.push(survivor);
        }

        (updated, invalidated)
    }

    /// Changed regions in new-content coordinates, merged and filtered by
    /// the configured minimum length.
    fn changed_ranges(&self, diffs: &[ContentDiff]) -> Vec<ChangedRange> {
        let mut ranges: Vec<ChangedRange> = diffs
            .iter()
            .map(|d| ChangedRange {
                start: d.start_offset,
                end: d.start_offset + text::char_len(&d.new_text),
            })
            .filter(|r| r.len() >= self.config.min_changed_range_length)
            .collect();
        ranges.sort_by_key(|r| (r.start, r.end));

        let mut merged: Vec<ChangedRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => {
                    last.end = last.end.max(range.end);
                }
                _ => merged.push(range),
            }
        }
        merged
    }

    /// Whether the changed text is worth a fresh analysis pass: enabled,
    /// and total length within the configured window.
    fn should_request_analysis(&self, changed_ranges: &[ChangedRange]) -> bool {
        if !self.config.enable_new_suggestion_requests || changed_ranges.is_empty() {
            return false;
        }
        let total: usize = changed_ranges.iter().map(ChangedRange::len).sum();
        total >= self.config.min_changed_range_length
            && total <= self.config.max_changed_range_length
    }

    /// Starts a review, waits for its completion notification, and fetches
    /// the resulting suggestions, deduplicated against `survivors`.
    ///
    /// Wrapped in bounded backoff for retryable failures. Cancellation
    /// aborts cleanly with no partial list.
    async fn request_new_suggestions(
        &self,
        post_id: &str,
        new_content: &str,
        survivors: &[Suggestion],
        cancel: &CancelToken,
    ) -> Result<Vec<Suggestion>, RemoteError> {
        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }
        let fetch = retry::with_backoff(&self.retry_policy, |attempt| {
            let auth = Arc::clone(&self.auth);
            let analysis = Arc::clone(&self.analysis);
            let timeout = self.config.review_timeout();
            async move {
                if attempt > 0 {
                    tracing::debug!(post_id = %post_id, attempt, "retrying new-suggestion request");
                }
                let token = auth.get_auth_token().await?;
                let handle = analysis.start_review(&token, post_id).await?;
                let mut subscription = analysis.subscribe_to_updates(&handle).await?;

                let wait = async {
                    loop {
                        match subscription.next_message().await {
                            Some(ReviewMessage::ReviewComplete { review_id })
                                if review_id == handle.review_id =>
                            {
                                return Ok(());
                            }
                            Some(ReviewMessage::ReviewError { message, .. }) => {
                                return Err(RemoteError::ReviewFailed(message));
                            }
                            // Completion of an unrelated run; keep waiting.
                            Some(ReviewMessage::ReviewComplete { .. }) => {}
                            None => return Err(RemoteError::SubscriptionClosed),
                        }
                    }
                };
                match tokio::time::timeout(timeout, wait).await {
                    Ok(outcome) => outcome?,
                    Err(_) => return Err(RemoteError::Timeout(timeout)),
                }

                analysis.fetch_suggestions(&token, post_id).await
            }
        });

        let fetched = tokio::select! {
            outcome = fetch => outcome?,
            () = cancel.cancelled() => {
                tracing::debug!(post_id, "new-suggestion request cancelled");
                return Ok(Vec::new());
            }
        };

        let known: Vec<&str> = survivors.iter().map(|s| s.id.as_str()).collect();
        let fresh = fetched
            .suggestions
            .into_iter()
            .filter(|s| !known.contains(&s.id.as_str()))
            .filter(|s| s.anchors_in(new_content))
            .collect();
        Ok(fresh)
    }
}

/// Splits `suggestions` into (anchored survivors, stale ids) against
/// `content`.
fn split_by_anchor(suggestions: &[Suggestion], content: &str) -> (Vec<Suggestion>, Vec<String>) {
    let mut kept = Vec::with_capacity(suggestions.len());
    let mut stale = Vec::new();
    for s in suggestions {
        if s.anchors_in(content) {
            kept.push(s.clone());
        } else {
            stale.push(s.id.clone());
        }
    }
    (kept, stale)
}
