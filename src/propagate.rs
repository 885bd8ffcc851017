//! Carrying the ambient context into work that runs elsewhere.
//!
//! A [`Propagator`] captures the calling thread's attributes when a task is
//! wrapped. When the wrapped task runs, on whatever thread, those
//! attributes are installed for the duration of the call and the executing
//! thread's store is cleaned up afterwards.
//!
//! # Lifecycle
//!
//! ```text
//! wrap (calling thread)          call (executing thread)
//! ---------------------          -----------------------
//! capture 5 attributes   --->    save executing thread's 5 attributes
//!                                install captured attributes
//!                                run task
//!                                clear store
//!                                restore saved attributes (if requested)
//!                                run hooks (failures ignored)
//! ```

use std::marker::PhantomData;

use tracing::Span;

use crate::attribute::AttributeSet;
use crate::hook;
use crate::principal::Principal;
use crate::security::SecurityContext;
use crate::store;

/// Configures how context is captured and restored.
///
/// # Examples
///
/// ```
/// use authenticated_request::{spinnaker_user, Propagator, User};
///
/// let task = Propagator::new()
///     .principal(User::new("alice").into())
///     .restore_original_context(false)
///     .wrap(|| spinnaker_user());
///
/// let seen = std::thread::spawn(move || task.call()).join().unwrap();
/// assert_eq!(seen.as_deref(), Some("alice"));
/// ```
#[derive(Debug, Clone)]
pub struct Propagator {
    restore_original_context: bool,
    principal: Option<Principal>,
}

impl Default for Propagator {
    fn default() -> Self {
        Self {
            restore_original_context: true,
            principal: None,
        }
    }
}

impl Propagator {
    /// Restores the executing thread's prior context; uses the ambient
    /// principal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the executing thread's prior attributes come back after the
    /// task. When `false` the store is left empty.
    pub fn restore_original_context(mut self, restore: bool) -> Self {
        self.restore_original_context = restore;
        self
    }

    /// Uses `principal` instead of the ambient [`SecurityContext`] principal.
    pub fn principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Captures the calling thread's context.
    pub fn capture(&self) -> CapturedContext {
        let attributes = match &self.principal {
            Some(principal) => AttributeSet::capture(principal),
            None => AttributeSet::capture(&SecurityContext::current()),
        };
        CapturedContext {
            attributes,
            restore_original_context: self.restore_original_context,
        }
    }

    /// Captures the calling thread's context and binds it to `task`.
    pub fn wrap<F, R>(&self, task: F) -> Propagated<F>
    where
        F: FnOnce() -> R,
    {
        Propagated {
            context: self.capture(),
            task,
        }
    }
}

/// Attributes captured on one thread, ready to be installed on another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedContext {
    attributes: AttributeSet,
    restore_original_context: bool,
}

impl CapturedContext {
    /// Builds a context from explicit attributes, e.g. ones read from
    /// inbound request headers.
    pub fn from_attributes(attributes: AttributeSet, restore_original_context: bool) -> Self {
        Self {
            attributes,
            restore_original_context,
        }
    }

    /// The captured attributes.
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Whether [`ContextGuard`] restores the prior context on drop.
    pub fn restores_original_context(&self) -> bool {
        self.restore_original_context
    }

    /// Installs the captured attributes on the current thread until the
    /// returned guard is dropped.
    pub fn enter(&self) -> ContextGuard {
        let original = AttributeSet::current();
        self.attributes.install();
        tracing::debug!(
            restore = self.restore_original_context,
            "installed propagated context"
        );

        ContextGuard {
            original: self.restore_original_context.then_some(original),
            _not_send: PhantomData,
        }
    }

    /// A span whose fields mirror the captured attributes.
    pub fn span(&self) -> Span {
        let attrs = &self.attributes;
        tracing::info_span!(
            "propagated_context",
            user = attrs.user.as_deref().unwrap_or_default(),
            accounts = attrs.accounts.as_deref().unwrap_or_default(),
            user_origin = attrs.user_origin.as_deref().unwrap_or_default(),
            request_id = attrs.request_id.as_deref().unwrap_or_default(),
            execution_id = attrs.execution_id.as_deref().unwrap_or_default(),
        )
    }
}

/// Clears (and optionally restores) the thread-local store when dropped.
///
/// Dropping happens on normal return and while unwinding from a panic, so
/// cleanup runs on every exit path. The guard is bound to the thread that
/// created it.
#[derive(Debug)]
#[must_use = "the propagated context is removed as soon as the guard is dropped"]
pub struct ContextGuard {
    original: Option<AttributeSet>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        store::clear();

        match self.original.take() {
            Some(original) => {
                original.restore();
                tracing::debug!("restored original context");
            }
            None => tracing::debug!("cleared propagated context"),
        }

        hook::run_clear_hooks();
    }
}

/// A task bound to a captured context.
#[derive(Debug)]
#[must_use = "a propagated task does nothing until called"]
pub struct Propagated<F> {
    context: CapturedContext,
    task: F,
}

impl<F> Propagated<F> {
    /// The context the task will run with.
    pub fn context(&self) -> &CapturedContext {
        &self.context
    }

    /// Runs the task with the captured context installed on the current
    /// thread.
    ///
    /// The task's return value, including any `Err`, is passed through
    /// unchanged. A panic in the task propagates after cleanup.
    pub fn call<R>(self) -> R
    where
        F: FnOnce() -> R,
    {
        let Propagated { context, task } = self;
        let _guard = context.enter();
        context.span().in_scope(task)
    }
}

/// Wraps `task` with the ambient principal, restoring the executing
/// thread's context afterwards.
pub fn propagate<F, R>(task: F) -> Propagated<F>
where
    F: FnOnce() -> R,
{
    Propagator::new().wrap(task)
}

/// Wraps `task` with the ambient principal.
///
/// With `restore_original_context` set, the executing thread gets its prior
/// attributes back after the call. With it unset, the executing thread's
/// store is left empty after the call, whatever it held before.
///
/// ```
/// use authenticated_request::{propagate_with_restore, store, SPINNAKER_USER};
///
/// store::put(SPINNAKER_USER, "worker");
/// propagate_with_restore(|| (), false).call();
/// assert!(store::is_empty());
///
/// store::put(SPINNAKER_USER, "worker");
/// propagate_with_restore(|| (), true).call();
/// assert_eq!(store::get(SPINNAKER_USER).as_deref(), Some("worker"));
/// ```
pub fn propagate_with_restore<F, R>(task: F, restore_original_context: bool) -> Propagated<F>
where
    F: FnOnce() -> R,
{
    Propagator::new()
        .restore_original_context(restore_original_context)
        .wrap(task)
}

/// Wraps `task` with an explicit principal, restoring the executing
/// thread's context afterwards.
pub fn propagate_as<F, R>(task: F, principal: Principal) -> Propagated<F>
where
    F: FnOnce() -> R,
{
    Propagator::new().principal(principal).wrap(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{
        SPINNAKER_ACCOUNTS, SPINNAKER_EXECUTION_ID, SPINNAKER_REQUEST_ID, SPINNAKER_USER,
        SPINNAKER_USER_ORIGIN,
    };
    use crate::principal::User;
    use crate::request::spinnaker_user;

    fn reset() {
        store::clear();
        SecurityContext::clear();
    }

    #[test]
    fn restore_brings_back_prior_values() {
        reset();
        store::put(SPINNAKER_USER, "bob");
        store::put(SPINNAKER_REQUEST_ID, "req-0");
        let task = propagate_as(|| spinnaker_user(), User::new("alice").into());

        let before = AttributeSet::current();
        let seen = task.call();

        assert_eq!(seen.as_deref(), Some("alice"));
        assert_eq!(AttributeSet::current(), before);
    }

    #[test]
    fn no_restore_leaves_store_empty() {
        reset();
        store::put(SPINNAKER_USER, "bob");
        store::put(SPINNAKER_ACCOUNTS, "prod");
        store::put(SPINNAKER_USER_ORIGIN, "deck");
        store::put(SPINNAKER_EXECUTION_ID, "exec-1");
        store::put("custom", "value");

        propagate_with_restore(|| (), false).call();

        assert!(store::is_empty());
    }

    #[test]
    fn restore_drops_unrelated_keys() {
        reset();
        store::put("custom", "value");
        store::put(SPINNAKER_USER, "bob");

        propagate(|| ()).call();

        assert!(store::get("custom").is_none());
        assert_eq!(store::get(SPINNAKER_USER).as_deref(), Some("bob"));
    }

    #[test]
    fn absent_captured_values_are_removed_during_call() {
        reset();
        let task = propagate(|| AttributeSet::current());

        store::put(SPINNAKER_USER_ORIGIN, "api");
        let during = task.call();

        assert!(during.user_origin.is_none());
        assert!(during.user.is_none());
        assert_eq!(store::get(SPINNAKER_USER_ORIGIN).as_deref(), Some("api"));
    }

    #[test]
    fn request_id_is_fixed_at_wrap_time() {
        reset();
        store::put(SPINNAKER_EXECUTION_ID, "exec-1");
        let task = propagate(|| store::get(SPINNAKER_REQUEST_ID));
        let captured = task.context().attributes().request_id.clone();

        let seen = task.call();

        assert_eq!(seen, captured);
        assert!(seen.unwrap().starts_with("exec-1:"));
    }

    #[test]
    fn ambient_principal_is_read_at_wrap_time() {
        reset();
        let task = {
            let _guard = SecurityContext::scope(User::new("alice").into());
            propagate(|| spinnaker_user())
        };

        assert!(SecurityContext::current().is_anonymous());
        assert_eq!(task.call().as_deref(), Some("alice"));
    }

    #[test]
    fn err_results_pass_through() {
        reset();
        let task = propagate(|| -> Result<(), String> { Err("boom".to_string()) });
        assert_eq!(task.call(), Err("boom".to_string()));
    }

    #[test]
    fn panic_still_cleans_up() {
        reset();
        store::put(SPINNAKER_USER, "bob");
        let task = propagate_as(|| -> u32 { panic!("task failed") }, User::new("alice").into());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| task.call()));

        let payload = result.expect_err("panic should propagate");
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"task failed"));
        assert_eq!(store::get(SPINNAKER_USER).as_deref(), Some("bob"));
    }

    #[test]
    fn guard_restores_on_drop() {
        reset();
        store::put(SPINNAKER_USER, "bob");
        let context = CapturedContext::from_attributes(
            AttributeSet {
                user: Some("alice".to_string()),
                ..AttributeSet::default()
            },
            true,
        );

        {
            let _guard = context.enter();
            assert_eq!(store::get(SPINNAKER_USER).as_deref(), Some("alice"));
        }
        assert_eq!(store::get(SPINNAKER_USER).as_deref(), Some("bob"));
    }

    #[test]
    fn default_propagator_restores() {
        let propagator = Propagator::default();
        assert!(propagator.capture().restores_original_context());
        assert!(!propagator
            .restore_original_context(false)
            .capture()
            .restores_original_context());
    }
}
