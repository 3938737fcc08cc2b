//! Remote collaborator boundary.
//!
//! The engine never talks HTTP itself — the host application injects
//! implementations of these traits (Cognito-backed auth, the posts CRUD
//! backend, the long-poll notification transport). Tests inject mocks.
//! Everything here is `Send + Sync` trait objects so a single session can
//! share one client across the recalculation service, the transition
//! manager, and the editor session.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use redline_core::types::Suggestion;

/// Failures at the collaborator boundary.
///
/// The engine treats these as freshness problems, not correctness
/// problems: a failed remote call degrades the result (existing
/// suggestions stay usable) and is logged, never propagated as a crash.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("network unreachable: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("analysis service rejected the request: {0}")]
    Rejected(String),
    #[error("update subscription closed before the review finished")]
    SubscriptionClosed,
    #[error("analysis run failed: {0}")]
    ReviewFailed(String),
}

impl RemoteError {
    /// Offline-shaped failures: the transition still succeeds, flagged as
    /// "offline, using existing suggestions".
    pub fn is_network_like(&self) -> bool {
        matches!(self, RemoteError::Network(_) | RemoteError::Timeout(_))
    }

    /// Whether retrying the same call can plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::Network(_) | RemoteError::Timeout(_) | RemoteError::SubscriptionClosed
        )
    }
}

/// Payload of a suggestion fetch for a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionFetch {
    pub suggestions: Vec<Suggestion>,
    /// Optional run summary shown in the review panel header.
    pub summary: Option<String>,
}

/// Ticket returned when an asynchronous analysis run is started.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewHandle {
    pub review_id: String,
    /// Bearer token scoped to the update subscription.
    pub token: String,
    /// Where the notification transport should connect.
    pub endpoint: String,
    /// Unix timestamp in milliseconds after which the handle is dead.
    pub expires_at: i64,
}

/// Messages delivered over the update subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewMessage {
    ReviewComplete { review_id: String },
    ReviewError { review_id: String, message: String },
}

/// A live subscription to analysis-run updates.
///
/// Dropping the subscription unsubscribes: the transport sees its sender
/// close and tears the connection down. This replaces the source design's
/// onMessage/onError callback pair with one typed channel.
#[derive(Debug)]
pub struct ReviewSubscription {
    receiver: mpsc::Receiver<ReviewMessage>,
}

impl ReviewSubscription {
    /// Wraps the receive half handed over by the transport.
    pub fn new(receiver: mpsc::Receiver<ReviewMessage>) -> Self {
        Self { receiver }
    }

    /// Waits for the next message; `None` means the transport closed the
    /// stream without delivering a terminal message.
    pub async fn next_message(&mut self) -> Option<ReviewMessage> {
        self.receiver.recv().await
    }
}

/// Opaque "get auth token" capability required by all remote calls.
#[async_trait]
pub trait AuthTokenProvider: Send + Sync {
    async fn get_auth_token(&self) -> Result<String, RemoteError>;
}

/// The analysis/CRUD backend as the engine sees it.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Fetches the current suggestion set for a post.
    async fn fetch_suggestions(
        &self,
        token: &str,
        post_id: &str,
    ) -> Result<SuggestionFetch, RemoteError>;

    /// Deletes a suggestion server-side. Best-effort at every call site:
    /// failures are logged and never fail the caller's success path.
    async fn delete_suggestion(&self, token: &str, suggestion_id: &str)
        -> Result<(), RemoteError>;

    /// Kicks off an asynchronous analysis run for a post.
    async fn start_review(&self, token: &str, post_id: &str) -> Result<ReviewHandle, RemoteError>;

    /// Opens the notification stream for a running review.
    async fn subscribe_to_updates(
        &self,
        handle: &ReviewHandle,
    ) -> Result<ReviewSubscription, RemoteError>;
}
