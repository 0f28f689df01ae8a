//! The single-shot completion callback handed to
//! [`Effect::async_callback`](super::Effect::async_callback).

use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::node::{Erased, erase};

type Slot = Arc<Mutex<Option<oneshot::Sender<Result<Erased, Erased>>>>>;

/// Untyped callback shared by every clone of a [`Callback`].
#[derive(Clone)]
pub(crate) struct ErasedCallback {
    slot: Slot,
}

impl ErasedCallback {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Result<Erased, Erased>>) {
        let (sender, receiver) = oneshot::channel();
        let callback = Self {
            slot: Arc::new(Mutex::new(Some(sender))),
        };
        (callback, receiver)
    }

    fn complete(&self, result: Result<Erased, Erased>) {
        let sender = self.slot.lock().take();
        match sender {
            // A closed receiver means the waiting fiber was canceled.
            Some(sender) => {
                let _ = sender.send(result);
            }
            None => report_repeated_completion(),
        }
    }
}

fn report_repeated_completion() {
    if cfg!(debug_assertions) {
        panic!("effio: async callback invoked more than once");
    }
    tracing::error!("async callback invoked more than once; extra completion ignored");
}

/// Completes a suspended [`Effect::async_callback`](super::Effect::async_callback).
///
/// The callback must be invoked exactly once. Clones share the same slot, so
/// invoking any two clones counts as a double invocation: that is fatal in
/// debug builds and logged then ignored in release builds. Dropping every
/// clone without invoking it is fatal.
///
/// # Examples
///
/// ```rust
/// use effio::effect::{Effect, Outcome, runtime};
///
/// let effect: Effect<String, i32> = Effect::async_callback(|callback| {
///     std::thread::spawn(move || callback.succeed(42));
/// });
/// assert_eq!(runtime::run_blocking(effect), Outcome::Succeeded(42));
/// ```
pub struct Callback<E, A> {
    inner: ErasedCallback,
    _marker: PhantomData<fn(Result<A, E>)>,
}

impl<E: Send + 'static, A: Send + 'static> Callback<E, A> {
    pub(crate) const fn new(inner: ErasedCallback) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Resumes the suspended effect with a result.
    pub fn complete(&self, result: Result<A, E>) {
        self.inner.complete(result.map(erase).map_err(erase));
    }

    /// Resumes the suspended effect with a success.
    pub fn succeed(&self, value: A) {
        self.complete(Ok(value));
    }

    /// Resumes the suspended effect with a failure.
    pub fn fail(&self, error: E) {
        self.complete(Err(error));
    }
}

impl<E, A> Clone for Callback<E, A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E, A> std::fmt::Debug for Callback<E, A> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self.inner.slot.lock().is_some();
        formatter
            .debug_struct("Callback")
            .field("pending", &pending)
            .finish()
    }
}
