//! Address-book menus: `alias_format` and `query_format`.

use maildata::{AddressList, AliasView};
use serde::Serialize;

use super::{Field, Provider, ValueKind, fields};
use crate::{
    definition::{Definition, PAD_EOL, PAD_HARD, PAD_SOFT},
    render::RenderFlags,
};

fields! {
    /// Fields of an address-book row.
    AliasField {
        /// All addresses, each in angle brackets.
        Address => "ADDRESS", String;
        /// Free-form comment.
        Comment => "COMMENT", String;
        /// `D` when marked for deletion.
        Flags => "FLAGS", String;
        /// Short alias name.
        Name => "NAME", String;
        /// One-based row number.
        Number => "NUMBER", Number;
        /// `*` when tagged.
        Tagged => "TAGGED", String;
        /// User tags.
        Tags => "TAGS", String;
    }
}

/// Codes for `alias_format`.
pub static ALIAS_FORMAT: &[Definition] = &[
    PAD_SOFT,
    PAD_HARD,
    PAD_EOL,
    Definition::new("a", "name", Field::Alias(AliasField::Name)),
    Definition::new("A", "address", Field::Alias(AliasField::Address)),
    Definition::new("C", "comment", Field::Alias(AliasField::Comment)),
    Definition::new("f", "flags", Field::Alias(AliasField::Flags)),
    Definition::new("i", "number", Field::Alias(AliasField::Number)),
    Definition::new("t", "tagged", Field::Alias(AliasField::Tagged)),
    Definition::new("Y", "tags", Field::Alias(AliasField::Tags)),
];

/// Codes for `query_format`.
pub static QUERY_FORMAT: &[Definition] = &[
    PAD_SOFT,
    PAD_HARD,
    PAD_EOL,
    Definition::new("a", "address", Field::Alias(AliasField::Address)),
    Definition::new("c", "number", Field::Alias(AliasField::Number)),
    Definition::new("e", "extra", Field::Alias(AliasField::Comment)),
    Definition::new("n", "name", Field::Alias(AliasField::Name)),
    Definition::new("t", "tagged", Field::Alias(AliasField::Tagged)),
    Definition::new("Y", "tags", Field::Alias(AliasField::Tags)),
];

/// Write every address in angle brackets, with its name when it has one.
fn bracketed(list: &AddressList) -> String {
    list.iter()
        .map(|a| match a.personal() {
            Some(p) => format!("{p} <{}>", a.mailbox),
            None => format!("<{}>", a.mailbox),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl Provider for AliasView<'_> {
    fn string(&self, field: Field, _flags: RenderFlags) -> Option<String> {
        let Field::Alias(f) = field else {
            return None;
        };
        let alias = self.alias;
        Some(match f {
            AliasField::Address => bracketed(&alias.addresses),
            AliasField::Comment => alias.comment.clone().unwrap_or_default(),
            AliasField::Flags => if self.deleted { "D" } else { " " }.to_string(),
            AliasField::Name => alias.name.clone(),
            AliasField::Tagged => if self.tagged { "*" } else { " " }.to_string(),
            AliasField::Tags => alias.tags.join(" "),
            AliasField::Number => return None,
        })
    }

    fn number(&self, field: Field, _flags: RenderFlags) -> Option<i64> {
        let Field::Alias(f) = field else {
            return None;
        };
        match f {
            AliasField::Number => i64::try_from(self.num + 1).ok(),
            AliasField::Tagged => Some(i64::from(self.tagged)),
            AliasField::Flags => Some(i64::from(self.deleted)),
            _ => None,
        }
    }
}
