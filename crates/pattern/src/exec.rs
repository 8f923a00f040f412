//! Evaluating compiled patterns.

use std::{collections::HashSet, io::BufRead};

use maildata::{Address, AliasView, Clock, Email, Envelope, MailStore};
use mailparse::parse_headers;
use tracing::{debug, warn};

use crate::{
    ExecFlags,
    date,
    ops::Op,
    tree::{Arg, DateArg, Leaf, Matcher, Pattern},
};

/// A cached boolean that may not have been computed yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheSlot {
    /// Not computed.
    #[default]
    Unset,
    /// Computed, false.
    False,
    /// Computed, true.
    True,
}

impl CacheSlot {
    /// The cached value, computing and storing it on first use.
    fn get_or(&mut self, compute: impl FnOnce() -> bool) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Unset => {
                let value = compute();
                *self = if value { Self::True } else { Self::False };
                value
            }
        }
    }
}

/// Per-message results shared by every pattern evaluated against that
/// message, e.g. when one message is scored against many rules.
///
/// The cache is only valid for a single message; call [`clear`] before
/// reusing it.
///
/// [`clear`]: PatternCache::clear
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternCache {
    /// `^~l`
    pub list_all: CacheSlot,
    /// `~l`
    pub list_one: CacheSlot,
    /// `^~u`
    pub sub_all: CacheSlot,
    /// `~u`
    pub sub_one: CacheSlot,
    /// `^~p`
    pub pers_recip_all: CacheSlot,
    /// `~p`
    pub pers_recip_one: CacheSlot,
    /// `^~P`
    pub pers_from_all: CacheSlot,
    /// `~P`
    pub pers_from_one: CacheSlot,
}

impl PatternCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, ready for the next message.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The slot for a cached operator, if it has one.
    fn slot(&mut self, op: Op, all_addr: bool) -> Option<&mut CacheSlot> {
        Some(match (op, all_addr) {
            (Op::List, true) => &mut self.list_all,
            (Op::List, false) => &mut self.list_one,
            (Op::SubscribedList, true) => &mut self.sub_all,
            (Op::SubscribedList, false) => &mut self.sub_one,
            (Op::PersonalRecip, true) => &mut self.pers_recip_all,
            (Op::PersonalRecip, false) => &mut self.pers_recip_one,
            (Op::PersonalFrom, true) => &mut self.pers_from_all,
            (Op::PersonalFrom, false) => &mut self.pers_from_one,
            _ => return None,
        })
    }
}

/// Apply `test` across address lists.
///
/// With `all`, every address must pass (an empty list passes); otherwise
/// one passing address is enough.
fn each_address<'e>(
    all: bool,
    lists: impl IntoIterator<Item = &'e [Address]>,
    mut test: impl FnMut(&Address) -> bool,
) -> bool {
    for addr in lists.into_iter().flatten() {
        if all ^ test(addr) {
            return !all;
        }
    }
    all
}

/// Evaluation context for one call of [`Pattern::exec`].
pub struct Eval<'a> {
    /// Evaluation options.
    pub flags: ExecFlags,
    /// The mailbox the message lives in.
    pub store: Option<&'a dyn MailStore>,
    /// Re-resolves dynamic dates.
    pub clock: &'a dyn Clock,
}

impl Eval<'_> {
    /// Evaluate `p` against `email`.
    pub fn pattern(&self, p: &Pattern, email: &Email, cache: Option<&mut PatternCache>) -> bool {
        let mut cache = cache;
        match p {
            Pattern::And(kids) => kids
                .iter()
                .all(|k| self.pattern(k, email, cache.as_deref_mut())),
            Pattern::Or(kids) => kids
                .iter()
                .any(|k| self.pattern(k, email, cache.as_deref_mut())),
            Pattern::Not(inner) => !self.pattern(inner, email, cache),
            Pattern::Thread(inner) => self.thread(inner, email),
            Pattern::Parent(inner) => self
                .store
                .and_then(|s| s.thread_parent(email))
                .is_some_and(|parent| self.pattern(inner, parent, None)),
            Pattern::Children(inner) => self.store.is_some_and(|s| {
                s.thread_children(email)
                    .into_iter()
                    .any(|kid| self.pattern(inner, kid, None))
            }),
            Pattern::Leaf(leaf) => self.leaf(leaf, email, cache),
        }
    }

    /// Does any message in `email`'s thread match?
    fn thread(&self, inner: &Pattern, email: &Email) -> bool {
        let Some(store) = self.store else {
            return false;
        };
        let mut seen = HashSet::new();
        let mut root = email;
        seen.insert(root.index);
        while let Some(parent) = store.thread_parent(root) {
            if !seen.insert(parent.index) {
                warn!(index = root.index, "thread parent links form a cycle");
                break;
            }
            root = parent;
        }

        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(e) = stack.pop() {
            if !seen.insert(e.index) {
                continue;
            }
            if self.pattern(inner, e, None) {
                return true;
            }
            let mut kids = store.thread_children(e);
            kids.reverse();
            stack.extend(kids);
        }
        false
    }

    /// Evaluate one test.
    fn leaf(&self, leaf: &Leaf, email: &Email, cache: Option<&mut PatternCache>) -> bool {
        let env = &email.envelope;
        let flags = &email.flags;
        match leaf.op {
            Op::All => true,
            Op::New => !(flags.old || flags.read),
            Op::Unread => !flags.read,
            Op::Old => flags.old && !flags.read,
            Op::Read => flags.read,
            Op::Replied => flags.replied,
            Op::Deleted => flags.deleted,
            Op::Flagged => flags.flagged,
            Op::Tagged => flags.tagged,
            Op::Expired => flags.expired,
            Op::Superseded => flags.superseded,
            Op::Collapsed => flags.collapsed && email.thread.hidden > 1,
            Op::CryptSign => email.crypt.signed,
            Op::CryptEncrypt => email.crypt.encrypted,
            Op::CryptVerified => email.crypt.good_sign,
            Op::PgpKey => email.crypt.pgp_key,
            Op::Duplicated => email.thread.duplicate,
            Op::Broken => email.thread.broken,
            Op::Unreferenced => self
                .store
                .is_some_and(|s| s.thread_children(email).is_empty()),

            Op::Message => in_range(leaf, email.msgno() as i64),
            Op::Score => in_range(leaf, email.score),
            Op::Size => in_range(leaf, i64::try_from(email.size).unwrap_or(i64::MAX)),
            Op::MimeAttach => in_range(leaf, i64::try_from(email.attach_count).unwrap_or(i64::MAX)),
            Op::Date => self.in_dates(leaf, email.date_sent),
            Op::DateReceived => self.in_dates(leaf, email.received),

            Op::Body | Op::Header | Op::WholeMsg => self.content(leaf, email),
            Op::ServerSearch => {
                debug!(index = email.index, "server-side search is only available over IMAP");
                false
            }

            Op::Sender => self.addresses(leaf, [&env.sender[..]]),
            Op::From => self.addresses(leaf, [&env.from[..]]),
            Op::To => self.addresses(leaf, [&env.to[..]]),
            Op::Cc => self.addresses(leaf, [&env.cc[..]]),
            Op::Bcc => self.addresses(leaf, [&env.bcc[..]]),
            Op::Address => self.addresses(
                leaf,
                [&env.from[..], &env.sender[..], &env.to[..], &env.cc[..], &env.bcc[..]],
            ),
            Op::Recipient => self.addresses(leaf, [&env.to[..], &env.cc[..], &env.bcc[..]]),

            Op::Subject => self.text(leaf, env.subject.as_deref()),
            Op::Id | Op::IdExternal => self.text(leaf, env.message_id.as_deref()),
            Op::XLabel => self.text(leaf, env.x_label.as_deref()),
            Op::Hormel => self.text(leaf, env.spam.as_deref()),
            Op::Newsgroups => self.text(leaf, env.newsgroups.as_deref()),
            Op::Reference => env
                .references
                .iter()
                .chain(&env.in_reply_to)
                .any(|r| self.text(leaf, Some(r))),
            Op::DriverTags => email.tags.iter().any(|t| self.text(leaf, Some(t))),
            Op::MimeType => email.mime_types.iter().any(|t| self.text(leaf, Some(t))),

            Op::List | Op::SubscribedList | Op::PersonalRecip | Op::PersonalFrom => {
                let compute = || self.known_addresses(leaf, env);
                match cache.and_then(|c| c.slot(leaf.op, leaf.all_addr)) {
                    Some(slot) => slot.get_or(compute),
                    None => compute(),
                }
            }
        }
    }

    /// `~l`, `~u`, `~p` and `~P`: addresses the store knows something about.
    fn known_addresses(&self, leaf: &Leaf, env: &Envelope) -> bool {
        let Some(store) = self.store else {
            debug!(op = %leaf.op, "no mailbox to check addresses against");
            return false;
        };
        let all = leaf.all_addr;
        match leaf.op {
            Op::List => each_address(all, [&env.to[..], &env.cc[..]], |a| store.is_mailing_list(a)),
            Op::SubscribedList => {
                each_address(all, [&env.to[..], &env.cc[..]], |a| store.is_subscribed_list(a))
            }
            Op::PersonalRecip => each_address(all, [&env.to[..], &env.cc[..], &env.bcc[..]], |a| {
                store.is_user_address(a)
            }),
            _ => each_address(all, [&env.from[..]], |a| store.is_user_address(a)),
        }
    }

    /// Match the leaf's text argument against addresses.
    fn addresses<'e>(&self, leaf: &Leaf, lists: impl IntoIterator<Item = &'e [Address]>) -> bool {
        let Some(matcher) = leaf.matcher() else {
            return false;
        };
        match_addresses(matcher, leaf, self.flags, self.store, lists)
    }

    /// Match the leaf's text argument against an optional field.
    fn text(&self, leaf: &Leaf, value: Option<&str>) -> bool {
        match (leaf.matcher(), value) {
            (Some(m), Some(v)) => m.matches(v, self.store),
            _ => false,
        }
    }

    /// Is `when` inside the leaf's date range?
    fn in_dates(&self, leaf: &Leaf, when: i64) -> bool {
        let Arg::Date(DateArg { range, dynamic }) = &leaf.arg else {
            return false;
        };
        let range = match dynamic {
            Some(src) => date::resolve(src, self.clock).unwrap_or_else(|e| {
                warn!(src = %src, error = %e, "dynamic date no longer resolves");
                *range
            }),
            None => *range,
        };
        range.contains(when)
    }

    /// Search the message headers, body, or both, one line at a time.
    fn content(&self, leaf: &Leaf, email: &Email) -> bool {
        let (Some(store), Some(matcher)) = (self.store, leaf.matcher()) else {
            return false;
        };
        let headers = || match store.open_headers(email) {
            Some(r) => header_lines(r).iter().any(|l| matcher.matches(l, Some(store))),
            None => {
                debug!(index = email.index, "no headers available");
                false
            }
        };
        let body = || match store.open_body(email) {
            Some(r) => r
                .split(b'\n')
                .map_while(|l| l.ok())
                .any(|l| matcher.matches(&lossy_line(&l), Some(store))),
            None => {
                debug!(index = email.index, "no body available");
                false
            }
        };
        match leaf.op {
            Op::Header => headers(),
            Op::Body => body(),
            _ => headers() || body(),
        }
    }
}

/// `true` if the leaf's range holds `n`.
fn in_range(leaf: &Leaf, n: i64) -> bool {
    match &leaf.arg {
        Arg::Range(r) => r.contains(n),
        _ => false,
    }
}

/// Decode one raw line, dropping a trailing CR. Invalid UTF-8 is replaced.
fn lossy_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw.strip_suffix(b"\r").unwrap_or(raw)).into_owned()
}

/// Read the raw header block, stopping after the blank line that ends it.
fn header_block(mut reader: Box<dyn BufRead + '_>) -> Vec<u8> {
    let mut raw = Vec::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                raw.extend_from_slice(&line);
                if line.trim_ascii().is_empty() {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "header read failed");
                break;
            }
        }
    }
    raw
}

/// Header lines as `Name: value`, unfolded and decoded.
fn header_lines(reader: Box<dyn BufRead + '_>) -> Vec<String> {
    let raw = header_block(reader);
    match parse_headers(&raw) {
        Ok((headers, _)) => headers
            .iter()
            .map(|h| format!("{}: {}", h.get_key(), h.get_value()))
            .collect(),
        Err(e) => {
            debug!(error = %e, "malformed header block, searching raw lines");
            raw.split(|b| *b == b'\n').map(lossy_line).collect()
        }
    }
}

/// Match addresses by mailbox, and by display name under
/// [`ExecFlags::FULL_ADDRESS`]. With `@`, only address-book entries count.
fn match_addresses<'e>(
    matcher: &Matcher,
    leaf: &Leaf,
    flags: ExecFlags,
    store: Option<&dyn MailStore>,
    lists: impl IntoIterator<Item = &'e [Address]>,
) -> bool {
    let full = flags.contains(ExecFlags::FULL_ADDRESS);
    each_address(leaf.all_addr, lists, |a| {
        let known = !leaf.is_alias || store.is_some_and(|s| s.is_alias(a));
        known
            && (matcher.matches(&a.mailbox, store)
                || (full && a.personal().is_some_and(|p| matcher.matches(p, store))))
    })
}

/// Evaluate `p` against an address-book row.
pub fn alias(
    p: &Pattern,
    flags: ExecFlags,
    view: &AliasView<'_>,
    cache: Option<&mut PatternCache>,
) -> bool {
    let mut cache = cache;
    let alias = view.alias;
    match p {
        Pattern::And(kids) => kids
            .iter()
            .all(|k| self::alias(k, flags, view, cache.as_deref_mut())),
        Pattern::Or(kids) => kids
            .iter()
            .any(|k| self::alias(k, flags, view, cache.as_deref_mut())),
        Pattern::Not(inner) => !self::alias(inner, flags, view, cache),
        Pattern::Leaf(leaf) => {
            let Some(m) = leaf.matcher() else {
                return false;
            };
            match leaf.op {
                Op::From => m.matches(&alias.name, None),
                Op::Cc => alias.comment.as_deref().is_some_and(|c| m.matches(c, None)),
                Op::To => match_addresses(m, leaf, flags, None, [&alias.addresses[..]]),
                Op::DriverTags => alias.tags.iter().any(|t| m.matches(t, None)),
                _ => false,
            }
        }
        Pattern::Thread(_) | Pattern::Parent(_) | Pattern::Children(_) => false,
    }
}
