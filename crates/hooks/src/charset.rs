//! `charset-hook` and `iconv-hook` mappings.

use regex::{Regex, RegexBuilder};

/// Which table a mapping belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// `charset-hook`: an alias for a real charset.
    Charset,
    /// `iconv-hook`: the name iconv knows a charset by.
    Iconv,
}

/// One mapping.
#[derive(Debug, Clone)]
struct Entry {
    /// Table.
    kind: LookupKind,
    /// Compiled from `pattern`, ignoring case.
    regex: Regex,
    /// Replacement name.
    replacement: String,
}

/// Ordered charset mappings. The first matching entry wins.
#[derive(Debug, Clone, Default)]
pub struct CharsetLookup {
    /// Entries in insertion order.
    entries: Vec<Entry>,
}

impl CharsetLookup {
    /// Add a mapping from names matching `pattern` to `replacement`.
    pub fn add(&mut self, kind: LookupKind, pattern: &str, replacement: &str) -> Result<(), regex::Error> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        self.entries.push(Entry {
            kind,
            regex,
            replacement: replacement.to_string(),
        });
        Ok(())
    }

    /// The replacement for `name`, if any entry of `kind` matches.
    pub fn lookup(&self, kind: LookupKind, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.kind == kind && e.regex.is_match(name))
            .map(|e| e.replacement.as_str())
    }

    /// Drop every mapping of both kinds.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No mappings?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
