//! Lookups of the ambient identity and tracing attributes.
//!
//! Every lookup is best-effort: none of them fail, and absent values come
//! back as `None`. Variants without an explicit principal consult
//! [`SecurityContext::current`].

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::attribute::{
    SPINNAKER_ACCOUNTS, SPINNAKER_EXECUTION_ID, SPINNAKER_REQUEST_ID, SPINNAKER_USER,
    SPINNAKER_USER_ORIGIN,
};
use crate::principal::Principal;
use crate::security::SecurityContext;
use crate::store;

/// Returns all five attributes keyed by header name.
///
/// Every key is present in the map; its value is `None` when the attribute
/// is unset. The request ID is always `Some` (see [`spinnaker_request_id`]).
///
/// # Examples
///
/// ```
/// use authenticated_request::{authentication_headers, SPINNAKER_USER};
///
/// let headers = authentication_headers();
/// assert_eq!(headers.len(), 5);
/// assert!(headers.contains_key(SPINNAKER_USER));
/// ```
pub fn authentication_headers() -> BTreeMap<&'static str, Option<String>> {
    BTreeMap::from([
        (SPINNAKER_USER, spinnaker_user()),
        (SPINNAKER_ACCOUNTS, spinnaker_accounts()),
        (SPINNAKER_USER_ORIGIN, spinnaker_user_origin()),
        (SPINNAKER_REQUEST_ID, spinnaker_request_id()),
        (SPINNAKER_EXECUTION_ID, spinnaker_execution_id()),
    ])
}

/// The current user, preferring the ambient principal over the store.
pub fn spinnaker_user() -> Option<String> {
    spinnaker_user_with(&SecurityContext::current())
}

/// The current user, preferring `principal`'s username over the store.
pub fn spinnaker_user_with(principal: &Principal) -> Option<String> {
    principal
        .username()
        .map(str::to_string)
        .or_else(|| store::get(SPINNAKER_USER))
}

/// The allowed accounts, preferring the ambient principal over the store.
pub fn spinnaker_accounts() -> Option<String> {
    spinnaker_accounts_with(&SecurityContext::current())
}

/// The allowed accounts, comma-joined.
///
/// A non-empty account list on `principal` wins over the stored value.
pub fn spinnaker_accounts_with(principal: &Principal) -> Option<String> {
    let accounts = principal.allowed_accounts();
    if accounts.is_empty() {
        store::get(SPINNAKER_ACCOUNTS)
    } else {
        Some(accounts.join(","))
    }
}

/// The request origin.
pub fn spinnaker_user_origin() -> Option<String> {
    store::get(SPINNAKER_USER_ORIGIN)
}

/// The execution ID.
pub fn spinnaker_execution_id() -> Option<String> {
    store::get(SPINNAKER_EXECUTION_ID)
}

/// Returns the stored request ID or creates a new one.
///
/// A stored request ID is returned unchanged. Otherwise a fresh one is
/// generated on every call and not written back:
///
/// 1. with an execution ID present: `"<execution id>:<uuid>"`
/// 2. without: a bare UUID
///
/// # Examples
///
/// ```
/// use authenticated_request::{spinnaker_request_id, store, SPINNAKER_EXECUTION_ID};
///
/// store::put(SPINNAKER_EXECUTION_ID, "exec-1");
/// let id = spinnaker_request_id().unwrap();
/// assert!(id.starts_with("exec-1:"));
/// ```
pub fn spinnaker_request_id() -> Option<String> {
    if let Some(existing) = store::get(SPINNAKER_REQUEST_ID) {
        return Some(existing);
    }

    let generated = match spinnaker_execution_id() {
        Some(execution_id) => format!("{}:{}", execution_id, Uuid::new_v4()),
        None => Uuid::new_v4().to_string(),
    };
    tracing::trace!(request_id = %generated, "synthesized request id");
    Some(generated)
}
