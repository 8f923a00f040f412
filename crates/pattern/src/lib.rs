//! Mail-selection patterns.
//!
//! A pattern such as `~f bob !~P | (~P ~C work)` is compiled once into a
//! [`Pattern`] tree and then evaluated against messages with
//! [`Pattern::exec`] or against address-book entries with
//! [`Pattern::alias_exec`].
//!
//! - [`ops`]: the operator table
//! - [`range`]: numeric and message-number ranges
//! - [`date`]: absolute and relative date ranges
//! - [`exec`]: evaluation and the per-message [`PatternCache`]
//! - [`simple`]: turning a plain search word into a pattern

use bitflags::bitflags;
use maildata::{Clock, MailStore};
use tracing::debug;

mod compile;
pub mod date;
mod error;
pub mod exec;
pub mod ops;
pub mod range;
pub mod simple;
mod token;
mod tree;


pub use error::{Error, ErrorKind, Result};
pub use exec::{CacheSlot, PatternCache};
pub use ops::{ArgKind, OPERATORS, Op, Operator};
pub use range::{Range, UNBOUNDED};
pub use simple::{ALIAS_SIMPLE_SEARCH, expand_simple};
pub use tree::{Arg, DateArg, Leaf, Matcher, Pattern};

bitflags! {
    /// Modes a pattern is compiled in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CompileFlags: u8 {
        /// Allow searching headers and bodies.
        const FULL_MSG = 1;
        /// Resolve relative dates on every evaluation.
        const DYNAMIC = 1 << 1;
        /// Allow searching a message being composed.
        const SEND_MODE_SEARCH = 1 << 2;
    }
}

bitflags! {
    /// Evaluation options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ExecFlags: u8 {
        /// Address operators also match the display name.
        const FULL_ADDRESS = 1;
    }
}

/// The open mailbox, for message ranges and external searches.
#[derive(Clone, Copy)]
pub struct MailboxView<'a> {
    /// Messages and mailbox knowledge.
    pub store: &'a dyn MailStore,
    /// Index of the message under the cursor.
    pub current: Option<usize>,
}

/// What a pattern is compiled against.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    /// Resolves relative dates.
    pub clock: &'a dyn Clock,
    /// The open mailbox, if any.
    pub mailbox: Option<MailboxView<'a>>,
}

impl<'a> Scope<'a> {
    /// A scope with no open mailbox.
    pub fn new(clock: &'a dyn Clock) -> Self {
        Self {
            clock,
            mailbox: None,
        }
    }

    /// Attach the open mailbox and the index of the current message.
    #[must_use]
    pub fn with_mailbox(mut self, store: &'a dyn MailStore, current: Option<usize>) -> Self {
        self.mailbox = Some(MailboxView { store, current });
        self
    }
}

/// Compile `src`.
///
/// Operators that search message content need [`CompileFlags::FULL_MSG`] or
/// [`CompileFlags::SEND_MODE_SEARCH`]; `~m` and `~I` need a mailbox in
/// `scope`.
pub fn compile(src: &str, flags: CompileFlags, scope: &Scope<'_>) -> Result<Pattern> {
    let compiler = compile::Compiler { flags, scope };
    let pattern = compiler.sequence(src, 0)?;
    debug!(src, flags = ?flags, tree = %pattern, "compiled pattern");
    Ok(pattern)
}
