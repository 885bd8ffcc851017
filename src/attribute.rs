//! Identity and tracing attributes.
//!
//! The header names below are a stable contract: log processors and
//! outbound HTTP headers key off them verbatim.

use std::fmt;

use crate::principal::Principal;
use crate::{request, store};

/// Authenticated user identity.
pub const SPINNAKER_USER: &str = "X-SPINNAKER-USER";
/// Comma-joined allowed accounts.
pub const SPINNAKER_ACCOUNTS: &str = "X-SPINNAKER-ACCOUNTS";
/// Origin of the request.
pub const SPINNAKER_USER_ORIGIN: &str = "X-SPINNAKER-USER-ORIGIN";
/// Per-request correlation ID.
pub const SPINNAKER_REQUEST_ID: &str = "X-SPINNAKER-REQUEST-ID";
/// Per-execution correlation ID.
pub const SPINNAKER_EXECUTION_ID: &str = "X-SPINNAKER-EXECUTION-ID";

/// One of the five propagated attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    /// Authenticated user identity
    User,
    /// Comma-joined allowed accounts
    Accounts,
    /// Origin of the request
    UserOrigin,
    /// Per-request correlation ID
    RequestId,
    /// Per-execution correlation ID
    ExecutionId,
}

impl Attribute {
    /// Every attribute, in header-table order.
    pub const ALL: [Attribute; 5] = [
        Attribute::User,
        Attribute::Accounts,
        Attribute::UserOrigin,
        Attribute::RequestId,
        Attribute::ExecutionId,
    ];

    /// The header-style key this attribute is stored under.
    pub const fn key(self) -> &'static str {
        match self {
            Attribute::User => SPINNAKER_USER,
            Attribute::Accounts => SPINNAKER_ACCOUNTS,
            Attribute::UserOrigin => SPINNAKER_USER_ORIGIN,
            Attribute::RequestId => SPINNAKER_REQUEST_ID,
            Attribute::ExecutionId => SPINNAKER_EXECUTION_ID,
        }
    }

    /// Matches a header name, ignoring ASCII case.
    ///
    /// ```
    /// use authenticated_request::Attribute;
    ///
    /// assert_eq!(Attribute::from_key("x-spinnaker-user"), Some(Attribute::User));
    /// assert_eq!(Attribute::from_key("Content-Type"), None);
    /// ```
    pub fn from_key(name: &str) -> Option<Attribute> {
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.key().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The five attribute values, each present or absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet {
    /// Authenticated user identity
    pub user: Option<String>,
    /// Comma-joined allowed accounts
    pub accounts: Option<String>,
    /// Origin of the request
    pub user_origin: Option<String>,
    /// Per-request correlation ID
    pub request_id: Option<String>,
    /// Per-execution correlation ID
    pub execution_id: Option<String>,
}

impl AttributeSet {
    /// Reads the current thread's stored values as-is.
    ///
    /// No derivation is applied: a missing request ID stays missing.
    pub fn current() -> Self {
        Self {
            user: store::get(SPINNAKER_USER),
            accounts: store::get(SPINNAKER_ACCOUNTS),
            user_origin: store::get(SPINNAKER_USER_ORIGIN),
            request_id: store::get(SPINNAKER_REQUEST_ID),
            execution_id: store::get(SPINNAKER_EXECUTION_ID),
        }
    }

    /// Captures the values a propagated task should run with.
    ///
    /// User and accounts prefer `principal` over the store. The request ID
    /// is synthesized when the store holds none.
    pub fn capture(principal: &Principal) -> Self {
        Self {
            user: request::spinnaker_user_with(principal),
            accounts: request::spinnaker_accounts_with(principal),
            user_origin: request::spinnaker_user_origin(),
            request_id: request::spinnaker_request_id(),
            execution_id: request::spinnaker_execution_id(),
        }
    }

    /// Returns the value held for `attr`.
    pub fn get(&self, attr: Attribute) -> Option<&str> {
        self.slot(attr).as_deref()
    }

    /// Sets or clears the value held for `attr`.
    pub fn set(&mut self, attr: Attribute, value: Option<String>) {
        *self.slot_mut(attr) = value;
    }

    /// Returns `true` if no attribute is present.
    pub fn is_empty(&self) -> bool {
        Attribute::ALL.into_iter().all(|attr| self.get(attr).is_none())
    }

    /// Writes all five attributes to the current thread's store: present
    /// values are put, absent ones removed.
    pub fn install(&self) {
        for attr in Attribute::ALL {
            match self.get(attr) {
                Some(value) => store::put(attr.key(), value),
                None => store::remove(attr.key()),
            }
        }
    }

    /// Writes only the present attributes, leaving other keys untouched.
    pub fn restore(&self) {
        for (key, value) in self.headers() {
            store::put(key, value);
        }
    }

    /// Iterates the present attributes as `(header name, value)` pairs,
    /// suitable for outbound request headers.
    pub fn headers(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        Attribute::ALL
            .into_iter()
            .filter_map(move |attr| self.get(attr).map(|value| (attr.key(), value)))
    }

    fn slot(&self, attr: Attribute) -> &Option<String> {
        match attr {
            Attribute::User => &self.user,
            Attribute::Accounts => &self.accounts,
            Attribute::UserOrigin => &self.user_origin,
            Attribute::RequestId => &self.request_id,
            Attribute::ExecutionId => &self.execution_id,
        }
    }

    fn slot_mut(&mut self, attr: Attribute) -> &mut Option<String> {
        match attr {
            Attribute::User => &mut self.user,
            Attribute::Accounts => &mut self.accounts,
            Attribute::UserOrigin => &mut self.user_origin,
            Attribute::RequestId => &mut self.request_id,
            Attribute::ExecutionId => &mut self.execution_id,
        }
    }
}
