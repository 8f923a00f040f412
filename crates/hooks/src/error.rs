//! Errors from hook commands and dispatch.

use std::{path::PathBuf, result::Result as StdResult};

use thiserror::Error;

/// Result alias for hook operations.
pub type Result<T> = StdResult<T, Error>;

/// Errors produced while parsing hook commands, sourcing rc files and firing
/// hooks.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrong number of arguments or an unterminated quote.
    #[error("{0}")]
    Syntax(String),

    /// The selector pattern did not compile.
    #[error(transparent)]
    Pattern(#[from] pattern::Error),

    /// The payload format string did not parse.
    #[error(transparent)]
    Expando(#[from] expando::Error),

    /// The selector regex did not compile.
    #[error("{regex}: {message}")]
    BadRegex {
        /// The regex as written.
        regex: String,
        /// What the regex engine reported.
        message: String,
    },

    /// A compress command must mention both `%f` and `%t`.
    #[error("badly formatted command string")]
    BadlyFormattedCommand,

    /// `^` was used before any mailbox was opened.
    #[error("current mailbox shortcut '^' is unset")]
    ShortcutNotSet,

    /// A mailbox shortcut expanded to nothing.
    #[error("mailbox shortcut expanded to empty regex")]
    EmptyRegex,

    /// `unhook` was given a name that is not a hook.
    #[error("unhook: unknown hook type: {0}")]
    UnknownHookType(String),

    /// `unhook *` while a hook is running.
    #[error("unhook: Can't do unhook * from within a hook")]
    UnhookFromInsideHook,

    /// `unhook X` while an `X` hook is running.
    #[error("unhook: Can't delete a {0} from within a {0}")]
    UnhookSameType(String),

    /// A hook's command failed and the event was abandoned.
    #[error("{0}")]
    CommandFailed(String),

    /// An rc file could not be read.
    #[error("{path}: {message}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// An error raised by a line of an rc file.
    #[error("{file}:{line}: {source}")]
    At {
        /// File name as given.
        file: String,
        /// One-based line number.
        line: usize,
        /// The underlying error.
        source: Box<Error>,
    },
}

impl Error {
    /// Warnings are reported but do not stop an rc file from being sourced.
    pub fn is_warning(&self) -> bool {
        match self {
            Self::Syntax(_) | Self::UnhookFromInsideHook | Self::UnhookSameType(_) => true,
            Self::At { source, .. } => source.is_warning(),
            _ => false,
        }
    }

    /// "NAME: too few arguments"
    pub(crate) fn too_few(name: &str) -> Self {
        Self::Syntax(format!("{name}: too few arguments"))
    }

    /// "NAME: too many arguments"
    pub(crate) fn too_many(name: &str) -> Self {
        Self::Syntax(format!("{name}: too many arguments"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn located_errors_keep_their_severity() {
        let err = Error::At {
            file: "hooks.rc".into(),
            line: 3,
            source: Box::new(Error::too_few("folder-hook")),
        };
        assert_eq!(err.to_string(), "hooks.rc:3: folder-hook: too few arguments");
        assert!(err.is_warning());
        assert!(!Error::BadlyFormattedCommand.is_warning());
    }
}
