//! Error handling for the mailfmt binary.

use std::{io, path::PathBuf, result};

use ron::error::SpannedError;
use thiserror::Error;

/// Convenient result type for mailfmt operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while running a mailfmt command.
#[derive(Debug, Error)]
pub enum Error {
    /// A fixture or rc file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// The file we tried to read.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// A fixture file is not valid RON for its type.
    #[error("bad fixture {path}: {source}")]
    Fixture {
        /// The fixture file.
        path: PathBuf,
        /// Parser error with position.
        source: SpannedError,
    },
    /// A format string failed to parse; the message is already pretty-printed.
    #[error("{0}")]
    Format(String),
    /// A pattern failed to compile; the message is already pretty-printed.
    #[error("{0}")]
    Pattern(String),
    /// A hook command or rc file failed.
    #[error(transparent)]
    Hooks(#[from] hooks::Error),
    /// AST dump failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A message number outside the fixture.
    #[error("no message {0} in the fixture")]
    NoMessage(usize),
}

impl Error {
    /// Wrap an expando parse error, rendered against its source.
    pub fn format(err: &expando::Error, source: &str) -> Self {
        Self::Format(err.pretty(source))
    }

    /// Wrap a pattern compile error, rendered against its source.
    pub fn pattern(err: &pattern::Error, source: &str) -> Self {
        Self::Pattern(err.pretty(source))
    }
}
