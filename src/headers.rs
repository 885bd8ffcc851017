//! Reading identity context from inbound request headers.
//!
//! The counterpart of [`AttributeSet::headers`]: a service receiving a
//! request from another service rebuilds the attribute set from the
//! `X-SPINNAKER-*` headers and installs it for the handler.

use crate::attribute::{Attribute, AttributeSet};
use crate::error::{Error, HeaderError, HeaderErrorKind};

/// Longest accepted header value, in bytes.
pub const MAX_HEADER_VALUE_LEN: usize = 8192;

impl AttributeSet {
    /// Builds an attribute set from request headers.
    ///
    /// Names match case-insensitively and unrelated headers are ignored.
    /// Values are trimmed; empty values count as absent. When a header
    /// repeats, the last occurrence wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if a recognized header's value
    /// contains control characters or exceeds [`MAX_HEADER_VALUE_LEN`].
    ///
    /// # Examples
    ///
    /// ```
    /// use authenticated_request::AttributeSet;
    ///
    /// let set = AttributeSet::from_headers([
    ///     ("x-spinnaker-user", "alice"),
    ///     ("content-type", "application/json"),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(set.user.as_deref(), Some("alice"));
    /// assert!(set.request_id.is_none());
    /// ```
    pub fn from_headers<I, K, V>(headers: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut set = AttributeSet::default();
        for (name, value) in headers {
            let Some(attr) = Attribute::from_key(name.as_ref()) else {
                continue;
            };
            let value = validate(attr, value.as_ref())?;
            set.set(attr, value);
        }
        Ok(set)
    }
}

fn validate(attr: Attribute, raw: &str) -> Result<Option<String>, HeaderError> {
    let trimmed = raw.trim();
    if trimmed.len() > MAX_HEADER_VALUE_LEN {
        return Err(HeaderError::new(
            HeaderErrorKind::TooLong {
                max: MAX_HEADER_VALUE_LEN,
            },
            attr.key(),
        ));
    }
    if trimmed.chars().any(char::is_control) {
        tracing::warn!(header = attr.key(), "rejected header with control characters");
        return Err(HeaderError::new(
            HeaderErrorKind::ContainsControlChars,
            attr.key(),
        ));
    }
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}
