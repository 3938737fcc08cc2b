//! Shared test doubles: a static auth provider and a scriptable analysis
//! backend.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use redline::remote::{
    AnalysisService, AuthTokenProvider, RemoteError, ReviewHandle, ReviewMessage,
    ReviewSubscription, SuggestionFetch,
};
use redline_core::types::{Suggestion, SuggestionKind, SuggestionPriority};

/// Builds a suggestion with the given anchor range.
pub fn suggestion(id: &str, start: usize, end: usize, anchor: &str, replace: &str) -> Suggestion {
    Suggestion {
        id: id.to_owned(),
        content_id: "post-1".to_owned(),
        start_offset: start,
        end_offset: end,
        text_to_replace: anchor.to_owned(),
        replace_with: replace.to_owned(),
        reason: "test fixture".to_owned(),
        priority: SuggestionPriority::Medium,
        kind: SuggestionKind::Grammar,
        context_before: String::new(),
        context_after: String::new(),
        created_at: 0,
    }
}

/// Auth provider that always returns the same token.
pub struct StaticAuth;

#[async_trait]
impl AuthTokenProvider for StaticAuth {
    async fn get_auth_token(&self) -> Result<String, RemoteError> {
        Ok("test-token".to_owned())
    }
}

/// How the mock's review subscription behaves.
#[derive(Debug, Clone)]
pub enum ReviewBehavior {
    /// Deliver `review_complete` immediately.
    Complete,
    /// Deliver `review_error` with this message.
    Fail(String),
    /// Close the stream without a terminal message.
    CloseSilently,
    /// Never send anything; the subscriber's timeout fires.
    Stall,
}

/// Scriptable analysis backend.
///
/// Error queues are popped per call; an empty queue means success. The
/// optional fetch gate lets a test hold a fetch open to observe
/// in-flight behavior.
pub struct MockAnalysis {
    pub fetch_payload: Mutex<Vec<Suggestion>>,
    pub fetch_errors: Mutex<VecDeque<RemoteError>>,
    pub start_errors: Mutex<VecDeque<RemoteError>>,
    pub delete_errors: Mutex<VecDeque<RemoteError>>,
    pub review_behavior: Mutex<ReviewBehavior>,
    pub fetch_gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub fetch_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub deleted: Mutex<Vec<String>>,
}

impl MockAnalysis {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fetch_payload: Mutex::new(Vec::new()),
            fetch_errors: Mutex::new(VecDeque::new()),
            start_errors: Mutex::new(VecDeque::new()),
            delete_errors: Mutex::new(VecDeque::new()),
            review_behavior: Mutex::new(ReviewBehavior::Complete),
            fetch_gate: Mutex::new(None),
            fetch_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
        })
    }

    pub fn serve_suggestions(&self, suggestions: Vec<Suggestion>) {
        *self.fetch_payload.lock().unwrap() = suggestions;
    }

    pub fn queue_start_error(&self, err: RemoteError) {
        self.start_errors.lock().unwrap().push_back(err);
    }

    pub fn queue_fetch_error(&self, err: RemoteError) {
        self.fetch_errors.lock().unwrap().push_back(err);
    }

    pub fn queue_delete_error(&self, err: RemoteError) {
        self.delete_errors.lock().unwrap().push_back(err);
    }

    pub fn set_review_behavior(&self, behavior: ReviewBehavior) {
        *self.review_behavior.lock().unwrap() = behavior;
    }

    /// Makes the next fetch block until the returned sender fires.
    pub fn gate_next_fetch(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.fetch_gate.lock().unwrap() = Some(rx);
        tx
    }
}

#[async_trait]
impl AnalysisService for MockAnalysis {
    async fn fetch_suggestions(
        &self,
        _token: &str,
        _post_id: &str,
    ) -> Result<SuggestionFetch, RemoteError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.fetch_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(err) = self.fetch_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(SuggestionFetch {
            suggestions: self.fetch_payload.lock().unwrap().clone(),
            summary: Some("analysis run".to_owned()),
        })
    }

    async fn delete_suggestion(
        &self,
        _token: &str,
        suggestion_id: &str,
    ) -> Result<(), RemoteError> {
        if let Some(err) = self.delete_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.deleted.lock().unwrap().push(suggestion_id.to_owned());
        Ok(())
    }

    async fn start_review(&self, _token: &str, post_id: &str) -> Result<ReviewHandle, RemoteError> {
        let call = self.start_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = self.start_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(ReviewHandle {
            review_id: format!("review-{call}"),
            token: "review-token".to_owned(),
            endpoint: format!("wss://example.test/reviews/{post_id}"),
            expires_at: i64::MAX,
        })
    }

    async fn subscribe_to_updates(
        &self,
        handle: &ReviewHandle,
    ) -> Result<ReviewSubscription, RemoteError> {
        let (tx, rx) = mpsc::channel(4);
        let behavior = self.review_behavior.lock().unwrap().clone();
        let review_id = handle.review_id.clone();
        match behavior {
            ReviewBehavior::Complete => {
                let _ = tx.send(ReviewMessage::ReviewComplete { review_id }).await;
            }
            ReviewBehavior::Fail(message) => {
                let _ = tx
                    .send(ReviewMessage::ReviewError { review_id, message })
                    .await;
            }
            ReviewBehavior::CloseSilently => drop(tx),
            ReviewBehavior::Stall => {
                // Leak the sender into a task that never sends, keeping
                // the stream open until the subscriber times out.
                tokio::spawn(async move {
                    let _tx = tx;
                    std::future::pending::<()>().await;
                });
            }
        }
        Ok(ReviewSubscription::new(rx))
    }
}
