//! Shell commands for compressed folders: `open-hook`, `close-hook` and
//! `append-hook` payloads.

use serde::Serialize;

use super::{Field, Provider, ValueKind, fields};
use crate::{Expando, definition::Definition, render::RenderFlags};

fields! {
    /// The two paths a compress command works on.
    CompressField {
        /// The compressed file.
        From => "FROM", String;
        /// The plain mailbox it expands to.
        To => "TO", String;
    }
}

/// Codes for compress-hook commands.
pub static COMPRESS_FORMAT: &[Definition] = &[
    Definition::new("f", "from", Field::Compress(CompressField::From)),
    Definition::new("t", "to", Field::Compress(CompressField::To)),
];

/// Paths substituted into a compress command.
#[derive(Debug, Clone, Copy)]
pub struct CompressPaths<'a> {
    /// The compressed file.
    pub from: &'a str,
    /// The plain mailbox.
    pub to: &'a str,
}

/// Quote `path` for a POSIX shell.
pub fn shell_quote(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 2);
    out.push('\'');
    for c in path.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// A compress command must mention both paths.
pub fn valid_command(cmd: &Expando) -> bool {
    cmd.uses_field(Field::Compress(CompressField::From))
        && cmd.uses_field(Field::Compress(CompressField::To))
}

impl Provider for CompressPaths<'_> {
    fn string(&self, field: Field, _flags: RenderFlags) -> Option<String> {
        match field {
            Field::Compress(CompressField::From) => Some(shell_quote(self.from)),
            Field::Compress(CompressField::To) => Some(shell_quote(self.to)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use maildata::FixedClock;

    use super::*;

    #[test]
    fn quotes_single_quotes() {
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn command_needs_both_paths() {
        let ok = Expando::parse("gzip -c %t > %f", COMPRESS_FORMAT).unwrap();
        assert!(valid_command(&ok));
        let bad = Expando::parse("gzip -c %t", COMPRESS_FORMAT).unwrap();
        assert!(!valid_command(&bad));
    }

    #[test]
    fn renders_quoted_paths() {
        let cmd = Expando::parse("gzip -dc %f > %t", COMPRESS_FORMAT).unwrap();
        let paths = CompressPaths {
            from: "/mail/a b.gz",
            to: "/tmp/x",
        };
        let clock = FixedClock::at(0);
        assert_eq!(
            cmd.render_unbounded(&paths, RenderFlags::empty(), &clock),
            "gzip -dc '/mail/a b.gz' > '/tmp/x'"
        );
    }
}
