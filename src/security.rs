//! Ambient security context.
//!
//! Authentication layers record the principal of the work running on a
//! thread here. Lookups and wrappers that are not handed an explicit
//! principal consult it.

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::principal::Principal;

thread_local! {
    static CURRENT: RefCell<Principal> = RefCell::new(Principal::Anonymous);
}

/// Access to the current thread's principal.
#[derive(Debug)]
pub struct SecurityContext {
    _private: (),
}

impl SecurityContext {
    /// Returns the current thread's principal, or [`Principal::Anonymous`].
    pub fn current() -> Principal {
        CURRENT.with(|current| current.borrow().clone())
    }

    /// Replaces the current thread's principal.
    pub fn set(principal: Principal) {
        CURRENT.with(|current| *current.borrow_mut() = principal);
    }

    /// Resets the current thread's principal to [`Principal::Anonymous`].
    pub fn clear() {
        Self::set(Principal::Anonymous);
    }

    /// Sets `principal` until the returned guard is dropped, then restores
    /// whatever principal was current before.
    ///
    /// # Examples
    ///
    /// ```
    /// use authenticated_request::{Principal, SecurityContext, User};
    ///
    /// {
    ///     let _guard = SecurityContext::scope(User::new("alice").into());
    ///     assert_eq!(SecurityContext::current().username(), Some("alice"));
    /// }
    /// assert!(SecurityContext::current().is_anonymous());
    /// ```
    pub fn scope(principal: Principal) -> SecurityGuard {
        let previous = CURRENT.with(|current| current.replace(principal));
        SecurityGuard {
            previous: Some(previous),
            _not_send: PhantomData,
        }
    }
}

/// Restores the previous principal when dropped.
///
/// Bound to the thread that created it.
#[derive(Debug)]
#[must_use = "the principal is restored as soon as the guard is dropped"]
pub struct SecurityGuard {
    previous: Option<Principal>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for SecurityGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            SecurityContext::set(previous);
        }
    }
}
