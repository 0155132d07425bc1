//! The crate's single error type, covering construction, parsing, and positional lookups.

/// Represents all types of errors that can be encountered when using the library.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A constructor or builder argument was out of its valid range, or contradicted
    /// another argument (e.g. both `count` and `until` given).
    InvalidParameter(&'static str),
    /// The RFC text parser encountered a property name it does not recognize.
    UnknownProperty(String),
    /// A recognized property was given an unsupported parameter, such as an RDATE
    /// with a `VALUE` other than `DATE-TIME`.
    UnsupportedParameter(String),
    /// The RFC text could not be parsed: malformed `KEY=VAL`, malformed datetime, or
    /// empty input.
    ParseError(String),
    /// A positional accessor (such as [`Rule::at`](crate::Rule::at)) was asked for an
    /// index beyond the end of the stream.
    IndexOutOfRange,
}

impl Error {
    pub(crate) fn invalid_parameter(reason: &'static str) -> Self {
        Error::InvalidParameter(reason)
    }

    pub(crate) fn unknown_property(name: impl Into<String>) -> Self {
        Error::UnknownProperty(name.into())
    }

    pub(crate) fn unsupported_parameter(reason: impl Into<String>) -> Self {
        Error::UnsupportedParameter(reason.into())
    }

    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        Error::ParseError(reason.into())
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidParameter(reason) => write!(f, "invalid parameter: {reason}"),
            Error::UnknownProperty(name) => write!(f, "unknown property: {name}"),
            Error::UnsupportedParameter(reason) => write!(f, "unsupported parameter: {reason}"),
            Error::ParseError(reason) => write!(f, "parse error: {reason}"),
            Error::IndexOutOfRange => f.write_str("index out of range"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
