use thiserror::Error;

/// Errors raised while compiling a pattern or running one of the drivers.
///
/// A failed match is not an error; drivers report it as `None`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    /// The pattern text could not be compiled.
    #[error("malformed pattern ({message}) at offset {offset}")]
    MalformedPattern { message: String, offset: usize },

    /// A replacement template referenced a capture the match does not have.
    #[error("invalid capture index %{index} in replacement string")]
    BadCaptureIndex { index: usize },

    /// A replacement template used `%` before something other than a digit or `%`.
    #[error("invalid use of '%' in replacement string")]
    InvalidReplacement,

    /// A callback or lookup produced a value with no textual form.
    #[error("invalid replacement value (a {type_name})")]
    InvalidReplacementValue { type_name: &'static str },

    /// The matcher ran past its configured step budget.
    #[error("pattern too complex (step budget of {limit} exceeded)")]
    BudgetExceeded { limit: usize },

    /// Error raised by a host callback or lookup, passed through unchanged.
    #[error("{0}")]
    Host(String),
}

impl PatternError {
    pub(crate) fn malformed(message: impl Into<String>, offset: usize) -> Self {
        PatternError::MalformedPattern {
            message: message.into(),
            offset,
        }
    }
}

pub type PatternResult<T> = Result<T, PatternError>;
