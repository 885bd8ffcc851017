//! Propagation for async tasks.
//!
//! Async executors may move a task between worker threads at every
//! `.await`. [`PropagatedFuture`] therefore installs its captured context
//! around each individual `poll` rather than once per task.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tracing::Span;

use crate::propagate::{CapturedContext, Propagator};

/// A future bound to a captured context.
///
/// # Examples
///
/// ```
/// use authenticated_request::{propagate_future, spinnaker_user, store, SPINNAKER_USER};
///
/// store::put(SPINNAKER_USER, "alice");
/// let fut = propagate_future(async { spinnaker_user() });
/// store::clear();
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// assert_eq!(rt.block_on(fut).as_deref(), Some("alice"));
/// ```
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct PropagatedFuture<F> {
    context: CapturedContext,
    span: Span,
    inner: Pin<Box<F>>,
}

impl<F> PropagatedFuture<F> {
    pub(crate) fn new(context: CapturedContext, inner: F) -> Self {
        let span = context.span();
        Self {
            context,
            span,
            inner: Box::pin(inner),
        }
    }

    /// The context each poll runs with.
    pub fn context(&self) -> &CapturedContext {
        &self.context
    }
}

impl<F: Future> Future for PropagatedFuture<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let _guard = this.context.enter();
        let _entered = this.span.enter();
        this.inner.as_mut().poll(cx)
    }
}

impl Propagator {
    /// Captures the calling thread's context and binds it to `future`.
    pub fn wrap_future<F: Future>(&self, future: F) -> PropagatedFuture<F> {
        PropagatedFuture::new(self.capture(), future)
    }
}

/// Wraps `future` with the ambient principal, restoring the polling
/// thread's context after every poll.
pub fn propagate_future<F: Future>(future: F) -> PropagatedFuture<F> {
    Propagator::new().wrap_future(future)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeSet, SPINNAKER_USER};
    use crate::principal::User;
    use crate::request::spinnaker_user;
    use crate::store;

    #[tokio::test]
    async fn context_is_installed_while_polling() {
        store::clear();
        let fut = Propagator::new()
            .principal(User::new("alice").into())
            .wrap_future(async { spinnaker_user() });

        store::put(SPINNAKER_USER, "bob");
        let seen = fut.await;

        assert_eq!(seen.as_deref(), Some("alice"));
        assert_eq!(store::get(SPINNAKER_USER).as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn context_survives_yield_points() {
        store::clear();
        let fut = Propagator::new()
            .principal(User::new("alice").into())
            .restore_original_context(false)
            .wrap_future(async {
                let before = spinnaker_user();
                tokio::task::yield_now().await;
                let after = spinnaker_user();
                (before, after)
            });

        let (before, after) = fut.await;

        assert_eq!(before.as_deref(), Some("alice"));
        assert_eq!(after.as_deref(), Some("alice"));
        assert_eq!(AttributeSet::current(), AttributeSet::default());
    }
}
