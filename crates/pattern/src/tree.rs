//! Compiled pattern trees.

use std::fmt;

use maildata::{Address, AliasView, Clock, Email, MailStore};
use regex::Regex;

use crate::{
    ExecFlags,
    exec::{self, PatternCache},
    ops::Op,
    range::Range,
};

/// How a leaf compares text.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// `~X re`: a regular expression.
    Regex(Regex),
    /// `=X text`: a substring, case-insensitive when `text` is lower case.
    Substring {
        /// Text to look for.
        text: String,
        /// Compare without case.
        ignore_case: bool,
    },
    /// `%X name`: membership of the address group `name`.
    Group(String),
    /// `~I`: exact membership of a list produced by an external search.
    Multi(Vec<String>),
}

impl Matcher {
    /// Does `text` match? Group lookups go through `store`.
    pub fn matches(&self, text: &str, store: Option<&dyn MailStore>) -> bool {
        match self {
            Self::Regex(re) => re.is_match(text),
            Self::Substring {
                text: needle,
                ignore_case: true,
            } => text.to_lowercase().contains(&needle.to_lowercase()),
            Self::Substring { text: needle, .. } => text.contains(needle.as_str()),
            Self::Group(group) => {
                store.is_some_and(|s| s.group_contains(group, &Address::new(text)))
            }
            Self::Multi(items) => items.iter().any(|i| i == text),
        }
    }
}

/// A date range, optionally re-resolved on every evaluation.
#[derive(Debug, Clone)]
pub struct DateArg {
    /// Range resolved at compile time.
    pub range: Range,
    /// Source text, kept when the range must follow the clock.
    pub dynamic: Option<String>,
}

/// What follows the operator letter.
#[derive(Debug, Clone)]
pub enum Arg {
    /// Nothing.
    None,
    /// Text comparison.
    Match(Matcher),
    /// Numeric or message-number range.
    Range(Range),
    /// Date range.
    Date(DateArg),
}

/// A single `~X arg` test.
#[derive(Debug, Clone)]
pub struct Leaf {
    /// What is tested.
    pub op: Op,
    /// `^`: every address must match instead of any.
    pub all_addr: bool,
    /// `@`: only addresses found in the address book count.
    pub is_alias: bool,
    /// Compiled for searching a message being composed.
    pub send_mode: bool,
    /// The argument.
    pub arg: Arg,
}

impl Leaf {
    /// The text matcher, if the argument is one.
    pub fn matcher(&self) -> Option<&Matcher> {
        match &self.arg {
            Arg::Match(m) => Some(m),
            _ => None,
        }
    }

    /// Does text comparison ignore case?
    pub fn ignore_case(&self) -> bool {
        match self.matcher() {
            Some(Matcher::Regex(re)) => re.as_str().chars().all(|c| !c.is_uppercase()),
            Some(Matcher::Substring { ignore_case, .. }) => *ignore_case,
            _ => false,
        }
    }

    /// Is this an address-group match?
    pub fn is_group(&self) -> bool {
        matches!(self.matcher(), Some(Matcher::Group(_)))
    }

    /// Is this a date that follows the clock?
    pub fn is_dynamic(&self) -> bool {
        matches!(&self.arg, Arg::Date(DateArg { dynamic: Some(_), .. }))
    }
}

/// A compiled pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Every child matches.
    And(Vec<Pattern>),
    /// Some child matches.
    Or(Vec<Pattern>),
    /// The child does not match.
    Not(Box<Pattern>),
    /// `~(p)`: some message in the thread matches.
    Thread(Box<Pattern>),
    /// `~<(p)`: the parent message matches.
    Parent(Box<Pattern>),
    /// `~>(p)`: some direct reply matches.
    Children(Box<Pattern>),
    /// A single test.
    Leaf(Leaf),
}

impl Pattern {
    /// Negate, folding double negation.
    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Visit every node, parents first.
    pub fn walk(&self, f: &mut dyn FnMut(&Self)) {
        f(self);
        match self {
            Self::And(kids) | Self::Or(kids) => kids.iter().for_each(|k| k.walk(f)),
            Self::Not(inner) | Self::Thread(inner) | Self::Parent(inner) | Self::Children(inner) => {
                inner.walk(f);
            }
            Self::Leaf(_) => {}
        }
    }

    /// Does any leaf read message content?
    pub fn reads_content(&self) -> bool {
        let mut found = false;
        self.walk(&mut |p| {
            if let Self::Leaf(leaf) = p {
                found |= leaf.op.reads_content();
            }
        });
        found
    }

    /// Does `email` match?
    ///
    /// `mailbox` supplies message content, thread links and address
    /// knowledge; tests that need it are false without it. `cache` holds
    /// results that are the same for every pattern evaluated against one
    /// message.
    pub fn exec(
        &self,
        flags: ExecFlags,
        mailbox: Option<&dyn MailStore>,
        email: &Email,
        cache: Option<&mut PatternCache>,
        clock: &dyn Clock,
    ) -> bool {
        let eval = exec::Eval {
            flags,
            store: mailbox,
            clock,
        };
        eval.pattern(self, email, cache)
    }

    /// Does the address-book row `view` match?
    ///
    /// Only `~f` (name), `~c` (comment), `~t` (addresses) and `~Y` (tags)
    /// apply to aliases; every other test is false.
    pub fn alias_exec(
        &self,
        flags: ExecFlags,
        view: &AliasView<'_>,
        cache: Option<&mut PatternCache>,
    ) -> bool {
        exec::alias(self, flags, view, cache)
    }

    /// Does any leaf depend on the clock at evaluation time?
    pub fn is_dynamic(&self) -> bool {
        let mut found = false;
        self.walk(&mut |p| {
            if let Self::Leaf(leaf) = p {
                found |= leaf.is_dynamic();
            }
        });
        found
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        if self.all_addr {
            f.write_str("^")?;
        }
        if self.is_alias {
            f.write_str("@")?;
        }
        write!(f, "{}", self.op)?;
        match &self.arg {
            Arg::None => {}
            Arg::Match(Matcher::Regex(re)) => write!(f, " /{}/", re.as_str())?,
            Arg::Match(Matcher::Substring { text, .. }) => write!(f, " {text:?}")?,
            Arg::Match(Matcher::Group(g)) => write!(f, " %{g}")?,
            Arg::Match(Matcher::Multi(items)) => write!(f, " [{}]", items.join(" "))?,
            Arg::Range(r) => write!(f, " {r}")?,
            Arg::Date(DateArg {
                dynamic: Some(src), ..
            }) => write!(f, " {src}")?,
            Arg::Date(DateArg { range, .. }) => write!(f, " @{}..@{}", range.min, range.max)?,
        }
        f.write_str(")")
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |f: &mut fmt::Formatter<'_>, name: &str, kids: &[Self]| {
            write!(f, "({name}")?;
            for k in kids {
                write!(f, " {k}")?;
            }
            f.write_str(")")
        };
        match self {
            Self::And(kids) => list(f, "and", kids),
            Self::Or(kids) => list(f, "or", kids),
            Self::Not(p) => write!(f, "(not {p})"),
            Self::Thread(p) => write!(f, "(thread {p})"),
            Self::Parent(p) => write!(f, "(parent {p})"),
            Self::Children(p) => write!(f, "(children {p})"),
            Self::Leaf(leaf) => write!(f, "{leaf}"),
        }
    }
}
