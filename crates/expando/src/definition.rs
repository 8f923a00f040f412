//! Definition tables: which format codes a string may use.
//!
//! Each config variable is bound to one static table. The parser resolves
//! `%X` and `%{name}` against it; anything not listed is an error.

use serde::Serialize;

use crate::domain::{Field, GlobalField};

/// How the three padding directives share out spare width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PadKind {
    /// `%|X`: fill to the end of the line, dropping anything after.
    FillEol,
    /// `%>X`: the right-hand side keeps its full width.
    HardFill,
    /// `%*X`: the left-hand side keeps its full width.
    SoftFill,
}

/// Special parsing attached to a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseHook {
    /// Plain `%X`.
    None,
    /// A padding directive followed by its fill character.
    Padding(PadKind),
    /// A strftime parameter enclosed up to `close`, e.g. `%[%H:%M]`.
    Date {
        /// Terminating character.
        close: char,
        /// Convert to local time before formatting.
        local: bool,
    },
    /// A name enclosed up to `close`, e.g. `%@name@`.
    Named {
        /// Terminating character.
        close: char,
    },
}

/// One legal format code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Definition {
    /// Short name used as `%X`.
    pub short: &'static str,
    /// Long name used as `%{name}`.
    pub long: Option<&'static str>,
    /// The data this code reads.
    pub field: Field,
    /// Special parsing, if any.
    pub hook: ParseHook,
}

impl Definition {
    /// A plain code.
    pub const fn new(short: &'static str, long: &'static str, field: Field) -> Self {
        Self {
            short,
            long: Some(long),
            field,
            hook: ParseHook::None,
        }
    }

    /// A strftime code whose parameter runs up to `close`.
    pub const fn date(short: &'static str, long: &'static str, field: Field, close: char, local: bool) -> Self {
        Self {
            short,
            long: Some(long),
            field,
            hook: ParseHook::Date { close, local },
        }
    }

    /// A code with a name parameter running up to `close`.
    pub const fn named(short: &'static str, long: &'static str, field: Field, close: char) -> Self {
        Self {
            short,
            long: Some(long),
            field,
            hook: ParseHook::Named { close },
        }
    }

    /// One of the padding codes.
    const fn padding(short: &'static str, long: &'static str, kind: PadKind) -> Self {
        let field = match kind {
            PadKind::FillEol => GlobalField::PaddingEol,
            PadKind::HardFill => GlobalField::PaddingHard,
            PadKind::SoftFill => GlobalField::PaddingSoft,
        };
        Self {
            short,
            long: Some(long),
            field: Field::Global(field),
            hook: ParseHook::Padding(kind),
        }
    }

    /// Is this a padding code?
    pub fn is_padding(&self) -> bool {
        matches!(self.hook, ParseHook::Padding(_))
    }
}

/// Soft fill, `%*X`.
pub const PAD_SOFT: Definition = Definition::padding("*", "padding-soft", PadKind::SoftFill);
/// Hard fill, `%>X`.
pub const PAD_HARD: Definition = Definition::padding(">", "padding-hard", PadKind::HardFill);
/// Fill to end of line, `%|X`.
pub const PAD_EOL: Definition = Definition::padding("|", "padding-eol", PadKind::FillEol);

/// The padding codes on their own, for strings that allow nothing else.
pub static GLOBAL_FORMAT: &[Definition] = &[PAD_SOFT, PAD_HARD, PAD_EOL];

/// Find the code at the start of `rest`.
///
/// Tables list longer names before their prefixes, so the first hit wins.
pub fn find_short(defs: &'static [Definition], rest: &str) -> Option<&'static Definition> {
    defs.iter().find(|d| rest.starts_with(d.short))
}

/// Find a code by its long name.
pub fn find_long(defs: &'static [Definition], name: &str) -> Option<&'static Definition> {
    defs.iter().find(|d| d.long == Some(name))
}

/// Find the code that reads `field`.
pub fn find_field(defs: &'static [Definition], field: Field) -> Option<&'static Definition> {
    defs.iter().find(|d| d.field == field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::msgid::MSGID_FORMAT;

    #[test]
    fn longest_short_name_wins() {
        assert_eq!(find_short(MSGID_FORMAT, "r12@x").map(|d| d.short), Some("r12"));
        assert_eq!(find_short(MSGID_FORMAT, "r1@x").map(|d| d.short), Some("r1"));
        assert_eq!(find_short(MSGID_FORMAT, "r3").map(|d| d.short), Some("r3"));
        assert!(find_short(MSGID_FORMAT, "Q").is_none());
    }

    #[test]
    fn padding_codes_are_global() {
        assert!(find_short(GLOBAL_FORMAT, ">-").is_some_and(Definition::is_padding));
        assert_eq!(find_long(GLOBAL_FORMAT, "padding-eol").map(|d| d.short), Some("|"));
    }
}
