//! Identity and tracing context propagation across threads and async tasks.
//!
//! Five attributes describe who a unit of work runs for and how it
//! correlates with the request that caused it:
//!
//! | Key | Meaning |
//! |---|---|
//! | `X-SPINNAKER-USER` | authenticated user identity |
//! | `X-SPINNAKER-ACCOUNTS` | comma-joined allowed accounts |
//! | `X-SPINNAKER-USER-ORIGIN` | origin of the request |
//! | `X-SPINNAKER-REQUEST-ID` | per-request correlation ID |
//! | `X-SPINNAKER-EXECUTION-ID` | per-execution correlation ID |
//!
//! They live in a thread-local [`store`] and, when a principal is known,
//! are derived from it. Work handed to another thread loses them unless it
//! is wrapped:
//!
//! - [`propagate`], [`propagate_with_restore`], [`propagate_as`] and the
//!   [`Propagator`] builder wrap closures
//! - [`propagate_future`] and [`Propagator::wrap_future`] wrap futures
//!
//! # Core Types
//!
//! - [`Attribute`] / [`AttributeSet`]: the five keys and a value set
//! - [`Principal`] / [`UserDetails`]: what is read from an authenticated identity
//! - [`SecurityContext`]: the current thread's principal
//! - [`CapturedContext`] / [`ContextGuard`]: scoped install and cleanup
//!
//! # Examples
//!
//! ```
//! use authenticated_request::{propagate_as, spinnaker_user, store, User, SPINNAKER_USER};
//!
//! let task = propagate_as(|| spinnaker_user(), User::new("alice").into());
//!
//! let seen = std::thread::spawn(move || {
//!     let seen = task.call();
//!     assert!(store::get(SPINNAKER_USER).is_none());
//!     seen
//! })
//! .join()
//! .unwrap();
//!
//! assert_eq!(seen.as_deref(), Some("alice"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod attribute;
mod error;
mod future;
mod headers;
mod hook;
mod principal;
mod propagate;
mod request;
mod security;
pub mod store;

pub use attribute::{
    Attribute, AttributeSet, SPINNAKER_ACCOUNTS, SPINNAKER_EXECUTION_ID, SPINNAKER_REQUEST_ID,
    SPINNAKER_USER, SPINNAKER_USER_ORIGIN,
};
pub use error::{Error, HeaderError, HeaderErrorKind};
pub use future::{propagate_future, PropagatedFuture};
pub use headers::MAX_HEADER_VALUE_LEN;
pub use hook::{clear_hooks, hook_count, register_hook, ContextHook};
pub use principal::{Principal, User, UserDetails};
pub use propagate::{
    propagate, propagate_as, propagate_with_restore, CapturedContext, ContextGuard, Propagated,
    Propagator,
};
pub use request::{
    authentication_headers, spinnaker_accounts, spinnaker_accounts_with, spinnaker_execution_id,
    spinnaker_request_id, spinnaker_user, spinnaker_user_origin, spinnaker_user_with,
};
pub use security::{SecurityContext, SecurityGuard};
