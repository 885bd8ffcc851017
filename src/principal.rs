//! Principal capability model.
//!
//! The principal object itself is owned by whatever authentication layer
//! the deployment uses. This crate only needs two things from it: a
//! username and a list of allowed accounts. [`UserDetails`] names those two
//! capabilities, and [`Principal`] makes the absence of a principal an
//! explicit variant.

use std::fmt;
use std::sync::Arc;

/// The identity capabilities this crate reads from an authenticated principal.
pub trait UserDetails: fmt::Debug + Send + Sync {
    /// The principal's username, if it has one.
    fn username(&self) -> Option<&str>;

    /// Accounts the principal may act on. Empty when unknown.
    fn allowed_accounts(&self) -> &[String] {
        &[]
    }
}

/// A plain authenticated user.
///
/// # Examples
///
/// ```
/// use authenticated_request::{User, UserDetails};
///
/// let user = User::new("alice").with_allowed_accounts(["prod", "test"]);
/// assert_eq!(user.username(), Some("alice"));
/// assert_eq!(user.allowed_accounts(), ["prod".to_string(), "test".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    /// Login name
    pub username: String,
    /// Contact address, if known
    pub email: Option<String>,
    /// Role names granted by the identity provider
    pub roles: Vec<String>,
    /// Accounts this user may act on
    pub allowed_accounts: Vec<String>,
}

impl User {
    /// Creates a user with no email, roles, or accounts.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    /// Sets the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Replaces the role list.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the allowed-accounts list.
    pub fn with_allowed_accounts<I, S>(mut self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_accounts = accounts.into_iter().map(Into::into).collect();
        self
    }
}

impl UserDetails for User {
    fn username(&self) -> Option<&str> {
        if self.username.is_empty() {
            None
        } else {
            Some(&self.username)
        }
    }

    fn allowed_accounts(&self) -> &[String] {
        &self.allowed_accounts
    }
}

/// The principal associated with a unit of work.
///
/// `Anonymous` means no principal is present; attribute lookups then fall
/// back to whatever the thread-local store already holds.
#[derive(Debug, Clone, Default)]
pub enum Principal {
    /// No authenticated principal
    #[default]
    Anonymous,
    /// An authenticated principal exposing [`UserDetails`]
    Authenticated(Arc<dyn UserDetails>),
}

impl Principal {
    /// Wraps any [`UserDetails`] implementation.
    pub fn authenticated(details: impl UserDetails + 'static) -> Self {
        Principal::Authenticated(Arc::new(details))
    }

    /// Returns `true` for [`Principal::Anonymous`].
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Principal::Anonymous)
    }

    /// The principal's username, if authenticated and named.
    pub fn username(&self) -> Option<&str> {
        match self {
            Principal::Anonymous => None,
            Principal::Authenticated(details) => details.username(),
        }
    }

    /// The principal's allowed accounts; empty when anonymous.
    pub fn allowed_accounts(&self) -> &[String] {
        match self {
            Principal::Anonymous => &[],
            Principal::Authenticated(details) => details.allowed_accounts(),
        }
    }
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Principal::authenticated(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct ServiceAccount;

    impl UserDetails for ServiceAccount {
        fn username(&self) -> Option<&str> {
            Some("svc-deployer")
        }
    }

    #[test]
    fn anonymous_has_no_identity() {
        let principal = Principal::default();
        assert!(principal.is_anonymous());
        assert!(principal.username().is_none());
        assert!(principal.allowed_accounts().is_empty());
    }

    #[test]
    fn user_principal_exposes_details() {
        let principal: Principal = User::new("alice")
            .with_email("alice@example.com")
            .with_roles(["admin"])
            .with_allowed_accounts(["prod", "staging"])
            .into();

        assert!(!principal.is_anonymous());
        assert_eq!(principal.username(), Some("alice"));
        assert_eq!(principal.allowed_accounts().len(), 2);
    }

    #[test]
    fn empty_username_reads_as_absent() {
        let principal = Principal::from(User::new(""));
        assert!(principal.username().is_none());
    }

    #[test]
    fn custom_details_default_to_no_accounts() {
        let principal = Principal::authenticated(ServiceAccount);
        assert_eq!(principal.username(), Some("svc-deployer"));
        assert!(principal.allowed_accounts().is_empty());
    }
}
