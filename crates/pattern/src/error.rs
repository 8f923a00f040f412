//! Pattern compile errors.

use std::result::Result as StdResult;

use thiserror::Error;

/// Category of a compile failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing to compile.
    Empty,
    /// `~X` where `X` is not an operator.
    UnknownOperator,
    /// The operator needs a compile mode that was not requested.
    NotAllowedHere,
    /// An operator that takes an argument was given none.
    MissingParameter,
    /// A `(` without its `)`.
    UnbalancedParens,
    /// The regex argument did not compile.
    BadRegex,
    /// A numeric or message range is malformed.
    BadRange,
    /// A date or date range is malformed.
    BadDate,
    /// Anything else the grammar does not accept.
    Syntax,
    /// The operator needs an open mailbox or a current message.
    NoMailbox,
}

/// Result alias for compilation.
pub type Result<T> = StdResult<T, Error>;

/// A pattern that failed to compile.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Error {
    /// Error category.
    pub kind: ErrorKind,
    /// Byte offset into the pattern string.
    pub offset: usize,
    /// Human-readable error message.
    pub message: String,
}

impl Error {
    /// Build an error.
    pub(crate) fn new(kind: ErrorKind, offset: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            offset,
            message: message.into(),
        }
    }

    /// Shift the offset of an error raised while compiling a sub-pattern that
    /// starts at `base`.
    pub(crate) fn shifted(mut self, base: usize) -> Self {
        self.offset += base;
        self
    }

    /// Render the message with the offending part of `source` underlined.
    pub fn pretty(&self, source: &str) -> String {
        let mut cut = self.offset.min(source.len());
        while !source.is_char_boundary(cut) {
            cut -= 1;
        }
        let col = source[..cut].chars().count();
        format!(
            "Pattern error at offset {}\n{}\n    | {}\n    | {}^\n",
            self.offset,
            self.message,
            source,
            " ".repeat(col)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_points_at_offset() {
        let e = Error::new(ErrorKind::UnknownOperator, 4, "~j: invalid pattern modifier");
        assert_eq!(
            e.pretty("~A ~j"),
            "Pattern error at offset 4\n~j: invalid pattern modifier\n    | ~A ~j\n    |     ^\n"
        );
        assert_eq!(e.clone().shifted(2).offset, 6);
    }
}
