//! Pattern compiler.
//!
//! Terms are collected left to right into a list. Juxtaposed terms are
//! AND-ed and `|` switches the list to OR; when the two meet, the terms so
//! far are grouped first, so `a b | c` is `(a b) | c` and `a | b c` is
//! `(a | b) c`.

use std::mem;

use regex::RegexBuilder;
use tracing::{debug, trace};

use crate::{
    CompileFlags, Scope,
    date,
    error::{Error, ErrorKind, Result},
    ops::{self, ArgKind, Operator},
    range::{Cursor, MessageRangeError, parse_message_range, parse_range},
    token,
    tree::{Arg, DateArg, Leaf, Matcher, Pattern},
};

/// Length of leading blanks.
fn blanks(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

/// Offset of the `)` closing a group whose body starts at `from`.
fn matching_paren(s: &str, from: usize) -> Option<usize> {
    let mut level = 1;
    for (i, b) in s.bytes().enumerate().skip(from) {
        match b {
            b'(' => level += 1,
            b')' => {
                level -= 1;
                if level == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Does `s` contain no upper-case characters?
fn is_lower(s: &str) -> bool {
    !s.chars().any(char::is_uppercase)
}

/// Modifiers waiting for the next term, and the terms collected so far.
#[derive(Default)]
struct Terms {
    /// Collected terms.
    list: Vec<Pattern>,
    /// `!` seen.
    not: bool,
    /// `^` seen.
    all_addr: bool,
    /// `@` seen.
    alias: bool,
    /// The list is an OR list.
    or: bool,
    /// The last thing seen was a term, not `|`.
    implicit: bool,
}

impl Terms {
    /// Replace the list with a single node made from it.
    fn group(&mut self, make: fn(Vec<Pattern>) -> Pattern) {
        let kids = mem::take(&mut self.list);
        self.list.push(make(kids));
    }

    /// Forget pending modifiers.
    fn reset(&mut self) {
        self.not = false;
        self.all_addr = false;
        self.alias = false;
    }

    /// Add a term, applying pending `!` and the implicit grouping.
    fn push(&mut self, term: Pattern) {
        if self.implicit && self.or {
            self.group(Pattern::Or);
            self.or = false;
        }
        self.list.push(if self.not { term.negate() } else { term });
        self.reset();
        self.implicit = true;
    }

    /// The finished pattern.
    fn finish(mut self, at: usize) -> Result<Pattern> {
        match self.list.len() {
            0 => Err(Error::new(ErrorKind::Empty, at, "empty pattern")),
            1 => self
                .list
                .pop()
                .ok_or_else(|| Error::new(ErrorKind::Empty, at, "empty pattern")),
            _ if self.or => Ok(Pattern::Or(self.list)),
            _ => Ok(Pattern::And(self.list)),
        }
    }
}

/// Compiler state shared by every nesting level.
pub struct Compiler<'a> {
    /// Requested modes.
    pub flags: CompileFlags,
    /// Clock and mailbox.
    pub scope: &'a Scope<'a>,
}

impl Compiler<'_> {
    /// Compile `src`, which starts at byte `base` of the whole pattern.
    pub fn sequence(&self, src: &str, base: usize) -> Result<Pattern> {
        let syntax = |pos: usize| {
            Error::new(
                ErrorKind::Syntax,
                base + pos,
                format!("error in pattern at: {}", &src[pos..]),
            )
        };
        let mut terms = Terms {
            implicit: true,
            ..Default::default()
        };
        let mut pos = blanks(src);
        while let Some(c) = src[pos..].chars().next() {
            match c {
                '^' => {
                    pos += 1;
                    terms.all_addr = !terms.all_addr;
                }
                '!' => {
                    pos += 1;
                    terms.not = !terms.not;
                }
                '@' => {
                    pos += 1;
                    terms.alias = !terms.alias;
                }
                '|' => {
                    if !terms.or {
                        if terms.list.is_empty() {
                            return Err(syntax(pos));
                        }
                        if terms.list.len() > 1 {
                            terms.group(Pattern::And);
                        }
                        terms.or = true;
                    }
                    pos += 1;
                    terms.implicit = false;
                    terms.reset();
                }
                '~' | '=' | '%' => pos = self.term(src, pos, base, &mut terms)?,
                '(' => {
                    let close = matching_paren(src, pos + 1).ok_or_else(|| {
                        Error::new(
                            ErrorKind::UnbalancedParens,
                            base + pos,
                            format!("mismatched parentheses: {}", &src[pos..]),
                        )
                    })?;
                    let sub = self.sequence(&src[pos + 1..close], base + pos + 1)?;
                    terms.push(sub);
                    pos = close + 1;
                }
                _ => return Err(syntax(pos)),
            }
            pos += blanks(&src[pos..]);
        }
        terms.finish(base)
    }

    /// Compile the term whose prefix (`~`, `=` or `%`) is at `pos`; returns
    /// the offset just past it.
    fn term(&self, src: &str, pos: usize, base: usize, terms: &mut Terms) -> Result<usize> {
        let prefix = &src[pos..=pos];
        let rest = &src[pos + 1..];
        let Some(tag) = rest.chars().next() else {
            return Err(Error::new(
                ErrorKind::MissingParameter,
                base + pos,
                format!("missing pattern: {prefix}"),
            ));
        };

        let thread: Option<(fn(Box<Pattern>) -> Pattern, usize)> = if rest.starts_with('(') {
            Some((Pattern::Thread, 1))
        } else if rest.starts_with("<(") {
            Some((Pattern::Parent, 2))
        } else if rest.starts_with(">(") {
            Some((Pattern::Children, 2))
        } else {
            None
        };
        if let Some((make, skip)) = thread {
            let open = pos + skip;
            let close = matching_paren(src, open + 1).ok_or_else(|| {
                Error::new(
                    ErrorKind::UnbalancedParens,
                    base + open,
                    format!("mismatched parentheses: {}", &src[open..]),
                )
            })?;
            let sub = self.sequence(&src[open + 1..close], base + open + 1)?;
            terms.push(make(Box::new(sub)));
            return Ok(close + 1);
        }

        let Some(operator) = ops::lookup(tag) else {
            return Err(Error::new(
                ErrorKind::UnknownOperator,
                base + pos,
                format!("{prefix}{tag}: invalid pattern modifier"),
            ));
        };
        if !operator.needs.is_empty() && !self.flags.intersects(operator.needs) {
            return Err(Error::new(
                ErrorKind::NotAllowedHere,
                base + pos,
                format!("{prefix}{tag}: not supported in this mode"),
            ));
        }

        let mut at = pos + 1 + tag.len_utf8();
        at += blanks(&src[at..]);
        let (arg, used) = if operator.arg == ArgKind::None {
            (Arg::None, 0)
        } else if at == src.len() {
            return Err(Error::new(ErrorKind::MissingParameter, base + at, "missing parameter"));
        } else {
            self.argument(operator, prefix, &src[at..])
                .map_err(|e| e.shifted(base + at))?
        };
        at += used;

        let leaf = Leaf {
            op: operator.op,
            all_addr: terms.all_addr,
            is_alias: terms.alias,
            send_mode: self.flags.contains(CompileFlags::SEND_MODE_SEARCH),
            arg,
        };
        trace!(leaf = %leaf, "compiled term");
        terms.push(Pattern::Leaf(leaf));
        Ok(at)
    }

    /// Parse the argument of `operator` at the start of `s`; error offsets
    /// are relative to `s`.
    fn argument(&self, operator: &Operator, prefix: &str, s: &str) -> Result<(Arg, usize)> {
        match operator.arg {
            ArgKind::None => Ok((Arg::None, 0)),
            ArgKind::Regex => {
                let (text, used) = word(s)?;
                Ok((Arg::Match(matcher(prefix, &text)?), used))
            }
            ArgKind::Query => {
                let (text, used) = word(s)?;
                Ok((Arg::Match(self.query(&text)?), used))
            }
            ArgKind::Date => {
                // A leading `=` would otherwise end the word.
                let eq = usize::from(s.starts_with('='));
                let (mut text, used) = word(&s[eq..])?;
                if eq == 1 {
                    text.insert(0, '=');
                }
                let range = date::resolve(&text, self.scope.clock)
                    .map_err(|msg| Error::new(ErrorKind::BadDate, 0, msg))?;
                let dynamic = self
                    .flags
                    .contains(CompileFlags::DYNAMIC)
                    .then_some(text);
                Ok((Arg::Date(DateArg { range, dynamic }), eq + used))
            }
            ArgKind::Range => {
                let (range, used) =
                    parse_range(s).map_err(|msg| Error::new(ErrorKind::BadRange, 0, msg))?;
                Ok((Arg::Range(range), used))
            }
            ArgKind::MessageRange => {
                let view = self.scope.mailbox.as_ref().ok_or_else(|| no_mailbox("No mailbox is open"))?;
                let cursor = Cursor {
                    count: view.store.emails().len(),
                    current: view.current.map(|i| i + 1),
                };
                match parse_message_range(s, &cursor) {
                    Ok((range, used)) => Ok((Arg::Range(range), used)),
                    Err(MessageRangeError::NoCurrent) => Err(no_mailbox("No current message")),
                    Err(MessageRangeError::Syntax) => Err(Error::new(
                        ErrorKind::BadRange,
                        0,
                        format!("Invalid message range: {s}"),
                    )),
                }
            }
        }
    }

    /// Run an external search and keep its Message-IDs.
    fn query(&self, query: &str) -> Result<Matcher> {
        let view = self.scope.mailbox.as_ref().ok_or_else(|| no_mailbox("No mailbox is open"))?;
        debug!(query, "running external search");
        let ids = view.store.external_search(query).ok_or_else(|| {
            Error::new(ErrorKind::NotAllowedHere, 0, "No search command defined")
        })?;
        Ok(Matcher::Multi(ids))
    }
}

/// An error for a missing mailbox or cursor.
fn no_mailbox(message: &str) -> Error {
    Error::new(ErrorKind::NoMailbox, 0, message)
}

/// One argument word, which must not be empty.
fn word(s: &str) -> Result<(String, usize)> {
    let (text, used) = token::extract(s).ok_or_else(|| {
        Error::new(ErrorKind::Syntax, 0, format!("Error in expression: {s}"))
    })?;
    if text.is_empty() {
        return Err(Error::new(ErrorKind::MissingParameter, 0, "Empty expression"));
    }
    Ok((text, used))
}

/// Build the matcher selected by `prefix`.
fn matcher(prefix: &str, text: &str) -> Result<Matcher> {
    match prefix {
        "=" => Ok(Matcher::Substring {
            text: text.to_string(),
            ignore_case: is_lower(text),
        }),
        "%" => Ok(Matcher::Group(text.to_string())),
        _ => RegexBuilder::new(text)
            .case_insensitive(is_lower(text))
            .build()
            .map(Matcher::Regex)
            .map_err(|e| Error::new(ErrorKind::BadRegex, 0, format!("'{text}': {e}"))),
    }
}
