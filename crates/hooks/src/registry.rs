//! Storage for hook records.
//!
//! Hooks live in one insertion-ordered list, except index-format hooks which
//! are kept per named slot. Every record gets a serial number on insertion;
//! walking the list by serial with [`Registry::next`] stays valid even when a
//! hook's command adds or removes hooks.

use std::{collections::HashMap, fmt, path::PathBuf};

use expando::Expando;
use maildata::{Clock, Email, MailStore};
use pattern::{ExecFlags, Pattern, PatternCache};
use regex::Regex;
use tracing::trace;

use crate::kind::HookType;

/// What picks the folders, addresses or messages a hook applies to.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Global hooks apply unconditionally.
    Always,
    /// Matched against a path, URL or address.
    Regex(Regex),
    /// Matched against a message.
    Pattern(Box<Pattern>),
}

/// One hook.
#[derive(Debug, Clone)]
pub struct Hook {
    /// Insertion serial, assigned by the registry.
    pub serial: u64,
    /// Exactly one type bit, plus [`HookType::GLOBAL`] for global hooks.
    pub kind: HookType,
    /// The selector as written, after shortcut expansion. Used to spot
    /// duplicates.
    pub source: String,
    /// Selector was prefixed with `!`.
    pub not: bool,
    /// Compiled selector.
    pub selector: Selector,
    /// Payload: a command line, a mailbox or a key id.
    pub command: String,
    /// Payload parsed as a format string, for hooks that render one.
    pub expando: Option<Expando>,
    /// Directory of the file the hook was defined in.
    pub source_dir: Option<PathBuf>,
}

impl Hook {
    /// A hook with no parsed payload, not yet inserted.
    pub fn new(kind: HookType, source: &str, not: bool, selector: Selector, command: &str) -> Self {
        Self {
            serial: 0,
            kind,
            source: source.to_string(),
            not,
            selector,
            command: command.to_string(),
            expando: None,
            source_dir: None,
        }
    }

    /// Does the selector match `text`?
    pub fn matches_text(&self, text: &str) -> bool {
        match &self.selector {
            Selector::Always => true,
            Selector::Regex(re) => re.is_match(text) != self.not,
            Selector::Pattern(_) => false,
        }
    }

    /// Does the selector match `email`?
    pub fn matches_email(
        &self,
        store: Option<&dyn MailStore>,
        email: &Email,
        cache: Option<&mut PatternCache>,
        clock: &dyn Clock,
    ) -> bool {
        match &self.selector {
            Selector::Always => true,
            Selector::Regex(_) => false,
            Selector::Pattern(p) => p.exec(ExecFlags::empty(), store, email, cache, clock) != self.not,
        }
    }

    /// Same selector, for duplicate detection.
    fn same_selector(&self, other: &Self) -> bool {
        self.kind == other.kind && self.not == other.not && self.source == other.source
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.command_name())?;
        if !matches!(self.selector, Selector::Always) {
            let not = if self.not { "!" } else { "" };
            write!(f, " {not}'{}'", self.source)?;
        }
        write!(f, " '{}'", self.command)
    }
}

/// What [`Registry::add`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Added {
    /// A new record was appended.
    Inserted,
    /// An identical record already existed; nothing changed.
    Duplicate,
    /// An existing record with the same selector took the new payload.
    Updated,
}

/// All registered hooks.
#[derive(Debug, Default)]
pub struct Registry {
    /// Simple hooks, in insertion order.
    hooks: Vec<Hook>,
    /// Index-format hooks by slot name, each list in insertion order.
    index_formats: HashMap<String, Vec<Hook>>,
    /// Serial handed to the next inserted record.
    next_serial: u64,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next serial.
    fn serial(&mut self) -> u64 {
        self.next_serial += 1;
        self.next_serial
    }

    /// Insert `hook`, unless it duplicates an existing record.
    ///
    /// Types that allow several commands per selector ignore an identical
    /// selector and command. The others keep one record per selector and
    /// replace its payload.
    pub fn add(&mut self, mut hook: Hook) -> Added {
        if hook.kind.allows_many() {
            if self
                .hooks
                .iter()
                .any(|h| h.same_selector(&hook) && h.command == hook.command)
            {
                return Added::Duplicate;
            }
        } else if let Some(at) = self.hooks.iter().position(|h| h.same_selector(&hook)) {
            let existing = &mut self.hooks[at];
            existing.command = hook.command;
            existing.expando = hook.expando;
            existing.source_dir = hook.source_dir;
            trace!(hook = %existing, "updated hook");
            return Added::Updated;
        }
        hook.serial = self.serial();
        trace!(hook = %hook, serial = hook.serial, "added hook");
        self.hooks.push(hook);
        Added::Inserted
    }

    /// Insert an index-format hook into slot `name`. A record with the same
    /// selector takes the new format.
    pub fn add_index_format(&mut self, name: &str, mut hook: Hook) -> Added {
        let list = self.index_formats.entry(name.to_string()).or_default();
        if let Some(existing) = list.iter_mut().find(|h| h.same_selector(&hook)) {
            existing.expando = hook.expando;
            existing.source_dir = hook.source_dir;
            return Added::Updated;
        }
        // Field access rather than `serial()`: `list` still borrows the map.
        self.next_serial += 1;
        hook.serial = self.next_serial;
        list.push(hook);
        Added::Inserted
    }

    /// Remove every hook whose type is covered by `kind`. Returns how many
    /// went.
    pub fn remove(&mut self, kind: HookType) -> usize {
        let before = self.hooks.len();
        self.hooks.retain(|h| !kind.contains(h.kind));
        before - self.hooks.len()
    }

    /// Remove every index-format hook.
    pub fn clear_index_formats(&mut self) {
        self.index_formats.clear();
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.hooks.clear();
        self.clear_index_formats();
    }

    /// All simple hooks in insertion order.
    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    /// The index-format hooks of slot `name`.
    pub fn index_formats(&self, name: &str) -> &[Hook] {
        self.index_formats.get(name).map_or(&[], Vec::as_slice)
    }

    /// The first hook of type `kind` inserted after serial `after`.
    pub fn next(&self, kind: HookType, after: u64) -> Option<&Hook> {
        self.hooks
            .iter()
            .find(|h| h.serial > after && h.kind == kind)
    }

    /// The first hook of type `kind` whose selector matches `candidate`.
    pub fn find_first(&self, kind: HookType, candidate: &str) -> Option<&Hook> {
        self.hooks
            .iter()
            .find(|h| h.kind == kind && h.matches_text(candidate))
    }

    /// The payloads of every hook of type `kind` matching `candidate`.
    pub fn list_matching(&self, kind: HookType, candidate: &str) -> Vec<&str> {
        self.hooks
            .iter()
            .filter(|h| h.kind == kind && h.matches_text(candidate))
            .map(|h| h.command.as_str())
            .collect()
    }

    /// Number of simple hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// No simple hooks?
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
