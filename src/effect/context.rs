//! Execution contexts: where effect steps run.
//!
//! An [`ExecutionContext`] is a handle to a tokio runtime, optionally with a
//! name used in log events. Shifting to a context changes where the rest of
//! an effect runs, never what it computes.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::runtime;

/// A place to run effect steps.
///
/// # Examples
///
/// ```rust
/// use effio::effect::ExecutionContext;
///
/// let background = ExecutionContext::global().named("background");
/// assert_eq!(background.name(), Some("background"));
/// ```
#[derive(Clone)]
pub struct ExecutionContext {
    handle: Handle,
    name: Option<Arc<str>>,
}

impl ExecutionContext {
    /// The runtime the caller is currently inside, or the global runtime.
    #[must_use]
    pub fn current() -> Self {
        Self::from_handle(runtime::handle())
    }

    /// The lazily created global runtime.
    #[must_use]
    pub fn global() -> Self {
        Self::from_handle(runtime::global().handle().clone())
    }

    /// Wraps an existing runtime handle.
    #[must_use]
    pub const fn from_handle(handle: Handle) -> Self {
        Self { handle, name: None }
    }

    /// Attaches a label reported in log events.
    #[must_use]
    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The label attached with [`named`](Self::named), if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The underlying runtime handle.
    #[must_use]
    pub const fn handle(&self) -> &Handle {
        &self.handle
    }

    pub(crate) fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ExecutionContext")
            .field("name", &self.name())
            .field("flavor", &self.handle.runtime_flavor())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn named_context_reports_name() {
        let context = ExecutionContext::global().named("io");
        assert_eq!(context.name(), Some("io"));
        assert_eq!(ExecutionContext::global().name(), None);
    }

    #[rstest]
    #[tokio::test(flavor = "current_thread")]
    async fn current_prefers_enclosing_runtime() {
        let context = ExecutionContext::current();
        assert_eq!(
            context.handle().runtime_flavor(),
            tokio::runtime::RuntimeFlavor::CurrentThread
        );
    }

    #[rstest]
    fn spawn_runs_on_handle() {
        let context = ExecutionContext::global();
        let joined = runtime::global().block_on(context.spawn(async { 7 }));
        assert_eq!(joined.unwrap(), 7);
    }
}
