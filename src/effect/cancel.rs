//! Hierarchical cancellation tokens.
//!
//! A [`CancelToken`] is shared by everything a run spawns. Canceling a token
//! cancels every child derived from it; canceling a child leaves the parent
//! untouched. This is how a race cancels its loser and how a parallel group
//! cancels the siblings of a failed operand.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;

/// A cloneable handle used to request cancellation of a running effect.
///
/// # Examples
///
/// ```rust
/// use effio::effect::CancelToken;
///
/// let parent = CancelToken::new();
/// let child = parent.child();
///
/// parent.cancel();
/// assert!(child.is_cancelled());
/// ```
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

struct Inner {
    state: watch::Sender<bool>,
    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn cancel(&self) {
        if self.state.send_replace(true) {
            return;
        }
        let children = std::mem::take(&mut *self.children.lock());
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

impl CancelToken {
    /// Creates a fresh, uncanceled token with no parent.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                state,
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Derives a token that is canceled whenever this one is.
    ///
    /// A child derived from an already canceled token starts canceled.
    #[must_use]
    pub fn child(&self) -> Self {
        let child = Self::new();
        let mut children = self.inner.children.lock();
        if self.is_cancelled() {
            drop(children);
            child.cancel();
        } else {
            children.retain(|existing| existing.strong_count() > 0);
            children.push(Arc::downgrade(&child.inner));
        }
        child
    }

    /// Requests cancellation of this token and all of its descendants.
    ///
    /// Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Returns `true` once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.inner.state.borrow()
    }

    /// Completes once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut receiver = self.inner.state.subscribe();
        // The sender lives as long as `self`, so this only returns once canceled.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }

    /// Returns a guard that cancels this token when dropped.
    #[must_use]
    pub fn drop_guard(self) -> DropGuard {
        DropGuard { token: Some(self) }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Cancels its token on drop unless disarmed.
#[derive(Debug)]
pub struct DropGuard {
    token: Option<CancelToken>,
}

impl DropGuard {
    /// Releases the token without canceling it.
    pub fn disarm(mut self) {
        self.token = None;
    }
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}
