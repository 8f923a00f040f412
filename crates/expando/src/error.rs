//! Error types for format-string parsing and config binding.

use std::{fmt::Write as _, result::Result as StdResult};

use thiserror::Error;

use crate::width::str_width;

/// What went wrong while parsing a format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// `%X` where `X` is not in the definition table.
    UnknownCode,
    /// Malformed `%-15.20` prefix, or a prefix where none is allowed.
    BadFormatSpec,
    /// A conditional without its `?`, `&` or closing delimiter.
    UnterminatedCondition,
    /// A `[...]`, `{...}` or `(...)` parameter without its terminator.
    MissingTerminator,
    /// Padding used where it makes no sense, e.g. as a condition.
    PaddingOutsideAllowed,
    /// The string ends with a lone `\`.
    TrailingEscape,
    /// A date conditional with an unknown unit.
    BadDate,
}

/// Result alias for parsing and config operations.
pub type Result<T> = StdResult<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors produced by the parser and the config binding.
pub enum Error {
    #[error("{message}")]
    /// The format string is malformed at `offset`.
    Parse {
        /// Error category.
        kind: ErrorKind,
        /// Byte offset of the offending character.
        offset: usize,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// A config variable rejected a value.
    Config {
        /// Name of the config variable.
        name: String,
        /// Human-readable error message, already prefixed with the option name.
        message: String,
    },
}

impl Error {
    /// Build a parse error.
    pub(crate) fn parse(kind: ErrorKind, offset: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            kind,
            offset,
            message: message.into(),
        }
    }

    /// The parse error category, if this is a parse error.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Parse { kind, .. } => Some(*kind),
            Self::Config { .. } => None,
        }
    }

    /// Byte offset into the format string, if this is a parse error.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Parse { offset, .. } => Some(*offset),
            Self::Config { .. } => None,
        }
    }

    /// Render the message with an excerpt of `source` pointing at the error.
    pub fn pretty(&self, source: &str) -> String {
        match self {
            Self::Parse {
                offset, message, ..
            } => format!(
                "Format error at offset {}\n{}\n{}",
                offset,
                message,
                excerpt_at(source, *offset)
            ),
            Self::Config { message, .. } => message.clone(),
        }
    }
}

/// Build a one-line excerpt of `source` with a caret under byte `offset`.
///
/// The caret column is measured in display cells so it lines up under wide
/// characters.
pub fn excerpt_at(source: &str, offset: usize) -> String {
    let mut cut = offset.min(source.len());
    while !source.is_char_boundary(cut) {
        cut -= 1;
    }
    let col = str_width(&source[..cut]);
    let mut out = String::new();
    let _ignored = writeln!(out, "    | {}", source);
    let _ignored = writeln!(out, "    | {}^", " ".repeat(col));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_points_at_offset() {
        let ex = excerpt_at("%3i %Q", 5);
        assert_eq!(ex, "    | %3i %Q\n    |      ^\n");
    }

    #[test]
    fn excerpt_clamps_inside_multibyte() {
        let ex = excerpt_at("日本%Q", 1);
        assert_eq!(ex, "    | 日本%Q\n    | ^\n");
        assert!(excerpt_at("日本%Q", 6).ends_with("    |     ^\n"));
    }

    #[test]
    fn pretty_includes_message() {
        let e = Error::parse(ErrorKind::UnknownCode, 1, "Unknown expando: %Q");
        let p = e.pretty("%Q");
        assert!(p.starts_with("Format error at offset 1\nUnknown expando: %Q\n"));
        assert_eq!(e.kind(), Some(ErrorKind::UnknownCode));
    }
}
