//! Cooperative cancellation for in-flight transitions and remote calls.
//!
//! A [`CancelToken`] is cloned into whatever async work should be
//! abortable; the owner calls [`CancelToken::cancel`] and every holder
//! observes it — either by polling [`CancelToken::is_cancelled`] between
//! steps or by racing [`CancelToken::cancelled`] in a `select!`. On
//! cancellation no partial result is ever emitted: callers bail out with
//! a cancellation error instead of returning half-updated suggestion
//! lists.

use tokio::sync::watch;

/// Shared cancellation flag. Cloning is cheap; all clones observe the
/// same state.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: watch::Sender<bool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Flips the token; idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the token is cancelled. Safe to race in `select!` —
    /// the watch channel observes a cancellation that lands between the
    /// check and the await.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        if *rx.borrow() {
            return;
        }
        // We hold a sender, so `changed` can only fail after self is
        // dropped — and self outlives this borrow.
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
    }
}
