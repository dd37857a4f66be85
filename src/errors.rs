use logos::Span;
use thiserror::Error;

/// The expression could not be tokenized or did not follow the grammar.
///
/// `fragment` is the offending slice of the input and `span` its byte range,
/// so that callers can highlight it. An empty fragment means the input ended
/// where more was expected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected {} at position {}", describe(.fragment), .span.start)]
pub struct SyntaxError {
    pub fragment: String,
    pub span: Span,
}

fn describe(fragment: &str) -> String {
    if fragment.is_empty() {
        "end of expression".to_owned()
    } else {
        format!("{fragment:?}")
    }
}

impl SyntaxError {
    pub(crate) fn new(fragment: &str, span: Span) -> SyntaxError {
        SyntaxError {
            fragment: fragment.to_owned(),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("unknown time range macro \"rill-{0}\"")]
    UnknownMacro(String),
    #[error("invalid ISO 8601 duration {text:?}: cannot use component {component:?}")]
    InvalidDuration { text: String, component: String },
    #[error("invalid time zone {0:?}")]
    TimeZoneInvalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("resolved time is outside of the supported range")]
    OutOfRange,
}

pub type ParseResult<T> = Result<T, ParseError>;
pub type ResolveResult<T> = Result<T, ResolveError>;
