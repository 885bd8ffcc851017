use std::fmt;

/// Errors that can occur while reading identity context from outside the
/// process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An inbound header value was rejected
    InvalidHeader(HeaderError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidHeader(e) => write!(f, "Invalid header: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidHeader(e) => Some(e),
        }
    }
}

impl From<HeaderError> for Error {
    fn from(e: HeaderError) -> Self {
        Error::InvalidHeader(e)
    }
}

/// A rejected inbound header.
///
/// The offending value is never included, only the header name and the
/// reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderError {
    /// Why the value was rejected
    pub kind: HeaderErrorKind,
    /// The header that carried it
    pub header: &'static str,
}

impl HeaderError {
    /// Creates a new header error.
    pub fn new(kind: HeaderErrorKind, header: &'static str) -> Self {
        Self { kind, header }
    }
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.header, self.kind)
    }
}

impl std::error::Error for HeaderError {}

/// Why an inbound header value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderErrorKind {
    /// Value contains control characters
    ContainsControlChars,
    /// Value exceeds the maximum length
    TooLong {
        /// The limit that was exceeded, in bytes
        max: usize,
    },
}

impl fmt::Display for HeaderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderErrorKind::ContainsControlChars => write!(f, "contains control characters"),
            HeaderErrorKind::TooLong { max } => write!(f, "exceeds {} bytes", max),
        }
    }
}
