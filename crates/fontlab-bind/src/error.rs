#![forbid(unsafe_code)]

//! Configuration-time errors for bindings.
//!
//! These are programmer errors raised while wiring a page. Bad user input
//! never produces a `BindError`: parsers normalize it to a fallback value.

/// Errors from [`Bindings::configure`](crate::Bindings::configure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// A parser tag that is neither built in nor registered.
    UnknownParser(String),
    /// A parser spec that is neither a function nor a tag. Holds the kind
    /// of value that was supplied.
    InvalidParserType(&'static str),
    /// A formatter tag that is neither built in nor registered.
    UnknownFormatter(String),
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownParser(tag) => write!(f, "unknown parser \"{tag}\""),
            Self::InvalidParserType(kind) => {
                write!(f, "parser should be a string or function, got {kind}")
            }
            Self::UnknownFormatter(tag) => write!(f, "unknown formatter \"{tag}\""),
        }
    }
}

impl std::error::Error for BindError {}
