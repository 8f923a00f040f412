//! The operator table.
//!
//! Every `~X` letter maps to one [`Op`], the compile modes it needs, and the
//! kind of argument that follows it.

use std::fmt;

use crate::CompileFlags;

/// What a leaf tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Op {
    All,
    Body,
    WholeMsg,
    Cc,
    Recipient,
    Date,
    Deleted,
    Sender,
    Expired,
    From,
    Flagged,
    CryptSign,
    CryptEncrypt,
    Header,
    Hormel,
    Id,
    IdExternal,
    PgpKey,
    Bcc,
    List,
    Address,
    Message,
    MimeType,
    Score,
    New,
    Old,
    PersonalRecip,
    PersonalFrom,
    Replied,
    DateReceived,
    Read,
    Subject,
    Superseded,
    To,
    Tagged,
    SubscribedList,
    Unread,
    Collapsed,
    CryptVerified,
    Newsgroups,
    Reference,
    MimeAttach,
    XLabel,
    DriverTags,
    Size,
    Duplicated,
    Unreferenced,
    Broken,
    ServerSearch,
}

/// The argument an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// No argument.
    None,
    /// A regex, substring or group name.
    Regex,
    /// A date or date range.
    Date,
    /// A numeric range.
    Range,
    /// A range of message numbers.
    MessageRange,
    /// A query passed to the external search.
    Query,
}

/// One row of the operator table.
#[derive(Debug)]
pub struct Operator {
    /// The letter after `~`.
    pub tag: char,
    /// What it tests.
    pub op: Op,
    /// Compile modes that enable it; empty means always available.
    pub needs: CompileFlags,
    /// Argument kind.
    pub arg: ArgKind,
    /// One-line description.
    pub help: &'static str,
}

/// Shorthand for building the table.
const fn row(tag: char, op: Op, needs: CompileFlags, arg: ArgKind, help: &'static str) -> Operator {
    Operator {
        tag,
        op,
        needs,
        arg,
        help,
    }
}

/// Modes that allow searching message content.
const CONTENT: CompileFlags = CompileFlags::FULL_MSG.union(CompileFlags::SEND_MODE_SEARCH);
/// No mode needed.
const ANY: CompileFlags = CompileFlags::empty();

/// All operators, in help order.
pub static OPERATORS: &[Operator] = &[
    row('A', Op::All, ANY, ArgKind::None, "all messages"),
    row('b', Op::Body, CONTENT, ArgKind::Regex, "messages whose body matches EXPR"),
    row('B', Op::WholeMsg, CONTENT, ArgKind::Regex, "messages whose body or headers match EXPR"),
    row('c', Op::Cc, ANY, ArgKind::Regex, "messages whose CC header matches EXPR"),
    row('C', Op::Recipient, ANY, ArgKind::Regex, "messages whose recipient matches EXPR"),
    row('d', Op::Date, ANY, ArgKind::Date, "messages sent in DATERANGE"),
    row('D', Op::Deleted, ANY, ArgKind::None, "deleted messages"),
    row('e', Op::Sender, ANY, ArgKind::Regex, "messages whose Sender header matches EXPR"),
    row('E', Op::Expired, ANY, ArgKind::None, "expired messages"),
    row('f', Op::From, ANY, ArgKind::Regex, "messages whose From header matches EXPR"),
    row('F', Op::Flagged, ANY, ArgKind::None, "flagged messages"),
    row('g', Op::CryptSign, ANY, ArgKind::None, "cryptographically signed messages"),
    row('G', Op::CryptEncrypt, ANY, ArgKind::None, "cryptographically encrypted messages"),
    row('h', Op::Header, CONTENT, ArgKind::Regex, "messages whose header matches EXPR"),
    row('H', Op::Hormel, ANY, ArgKind::Regex, "messages whose spam tag matches EXPR"),
    row('i', Op::Id, ANY, ArgKind::Regex, "messages whose Message-ID matches EXPR"),
    row('I', Op::IdExternal, ANY, ArgKind::Query, "messages whose Message-ID is found by QUERY"),
    row('k', Op::PgpKey, ANY, ArgKind::None, "messages which contain PGP key"),
    row('K', Op::Bcc, ANY, ArgKind::Regex, "messages whose BCC header matches EXPR"),
    row('l', Op::List, ANY, ArgKind::None, "messages addressed to known mailing lists"),
    row('L', Op::Address, ANY, ArgKind::Regex, "messages whose From/Sender/To/CC matches EXPR"),
    row('m', Op::Message, ANY, ArgKind::MessageRange, "messages whose number is in RANGE"),
    row('M', Op::MimeType, CompileFlags::FULL_MSG, ArgKind::Regex, "messages with a Content-Type matching EXPR"),
    row('n', Op::Score, ANY, ArgKind::Range, "messages whose score is in RANGE"),
    row('N', Op::New, ANY, ArgKind::None, "new messages"),
    row('O', Op::Old, ANY, ArgKind::None, "old messages"),
    row('p', Op::PersonalRecip, ANY, ArgKind::None, "messages addressed to you"),
    row('P', Op::PersonalFrom, ANY, ArgKind::None, "messages from you"),
    row('Q', Op::Replied, ANY, ArgKind::None, "messages which have been replied to"),
    row('r', Op::DateReceived, ANY, ArgKind::Date, "messages received in DATERANGE"),
    row('R', Op::Read, ANY, ArgKind::None, "already read messages"),
    row('s', Op::Subject, ANY, ArgKind::Regex, "messages whose Subject header matches EXPR"),
    row('S', Op::Superseded, ANY, ArgKind::None, "superseded messages"),
    row('t', Op::To, ANY, ArgKind::Regex, "messages whose To header matches EXPR"),
    row('T', Op::Tagged, ANY, ArgKind::None, "tagged messages"),
    row('u', Op::SubscribedList, ANY, ArgKind::None, "messages addressed to subscribed mailing lists"),
    row('U', Op::Unread, ANY, ArgKind::None, "unread messages"),
    row('v', Op::Collapsed, ANY, ArgKind::None, "messages in collapsed threads"),
    row('V', Op::CryptVerified, ANY, ArgKind::None, "cryptographically verified messages"),
    row('w', Op::Newsgroups, ANY, ArgKind::Regex, "newsgroups matching EXPR"),
    row('x', Op::Reference, ANY, ArgKind::Regex, "messages whose References header matches EXPR"),
    row('X', Op::MimeAttach, ANY, ArgKind::Range, "messages with RANGE attachments"),
    row('y', Op::XLabel, ANY, ArgKind::Regex, "messages whose X-Label header matches EXPR"),
    row('Y', Op::DriverTags, ANY, ArgKind::Regex, "messages whose tags match EXPR"),
    row('z', Op::Size, ANY, ArgKind::Range, "messages whose size is in RANGE"),
    row('=', Op::Duplicated, ANY, ArgKind::None, "duplicated messages"),
    row('$', Op::Unreferenced, ANY, ArgKind::None, "unreferenced messages"),
    row('#', Op::Broken, ANY, ArgKind::None, "broken threads"),
    row('/', Op::ServerSearch, ANY, ArgKind::Regex, "IMAP custom server-side search for STRING"),
];

/// Look up the operator for `tag`.
pub fn lookup(tag: char) -> Option<&'static Operator> {
    OPERATORS.iter().find(|o| o.tag == tag)
}

impl Op {
    /// The table row for this operation.
    pub fn operator(self) -> Option<&'static Operator> {
        OPERATORS.iter().find(|o| o.op == self)
    }

    /// Does evaluating this operation read the message content?
    pub fn reads_content(self) -> bool {
        matches!(self, Self::Body | Self::WholeMsg | Self::Header)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator() {
            Some(o) => write!(f, "~{}", o.tag),
            None => write!(f, "{self:?}"),
        }
    }
}
