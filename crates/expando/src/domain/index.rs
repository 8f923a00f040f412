//! The message index: `index_format` and friends.
//!
//! Three domains meet here. Header fields come from the envelope, per-message
//! state from the email itself, and a couple of codes describe the mailbox.

use chrono::{DateTime, FixedOffset, Utc};
use maildata::{Address, Email, MailStore};
use serde::{Deserialize, Serialize};

use super::{Field, Provider, ValueKind, fields};
use crate::{
    definition::{Definition, PAD_EOL, PAD_HARD, PAD_SOFT},
    render::RenderFlags,
};

fields! {
    /// Header-derived fields.
    EnvelopeField {
        /// Author's mailbox.
        From => "FROM", String;
        /// Reply-To mailbox.
        ReplyTo => "REPLY_TO", String;
        /// Local part of the first mailing list addressed.
        ListAddress => "LIST_ADDRESS", String;
        /// Full `From:` header.
        FromFull => "FROM_FULL", String;
        /// Author's name, or the recipient's when the user sent it.
        Sender => "SENDER", String;
        /// As `Sender` without the `To ` prefix.
        SenderPlain => "SENDER_PLAIN", String;
        /// Spam attribute.
        Spam => "SPAM", String;
        /// `Message-ID:`
        MessageId => "MESSAGE_ID", String;
        /// Author's initials.
        Initials => "INITIALS", String;
        /// Like `ListAddress`, but empty when no list is addressed.
        ListEmpty => "LIST_EMPTY", String;
        /// `To <list>` for list mail, the author otherwise.
        ListOrFrom => "LIST_FROM", String;
        /// Author's name, or mailbox.
        Name => "NAME", String;
        /// `Newsgroups:`
        Newsgroup => "NEWSGROUP", String;
        /// All `To:` recipients.
        ToAll => "TO_ALL", String;
        /// All `Cc:` recipients.
        CcAll => "CC_ALL", String;
        /// `Subject:`
        Subject => "SUBJECT", String;
        /// First `To:` recipient.
        To => "TO", String;
        /// Local part of the author's mailbox.
        Username => "USERNAME", String;
        /// First word of the author's name.
        FirstName => "FIRST_NAME", String;
        /// `Organization:`
        Organization => "ORGANIZATION", String;
        /// `X-Comment-To:`
        XCommentTo => "X_COMMENT_TO", String;
        /// `X-Label:`
        XLabel => "X_LABEL", String;
    }
}

fields! {
    /// Per-message state.
    EmailField {
        /// Size, human readable.
        Size => "SIZE", Number;
        /// One-based message number.
        Number => "NUMBER", Number;
        /// Driver tags.
        Tags => "TAGS", String;
        /// Body lines.
        Lines => "LINES", Number;
        /// Score.
        Score => "SCORE", Number;
        /// Single status character.
        StatusChar => "STATUS_CHAR", String;
        /// How the message is addressed to the user.
        ToChars => "TO_CHARS", String;
        /// Number of MIME parts.
        AttachCount => "ATTACHMENT_COUNT", Number;
        /// Status, crypto and message flags together.
        CombinedFlags => "FLAG_CHARS", String;
        /// Crypto flag.
        CryptoFlags => "CRYPTO_FLAGS", String;
        /// Status flag.
        StatusFlags => "STATUS_FLAGS", String;
        /// Tag, flag and addressing character.
        MessageFlags => "MESSAGE_FLAGS", String;
        /// Sent date in local time.
        DateLocal => "DATE_STRF_LOCAL", Number;
        /// Sent date in the sender's zone.
        DateSender => "DATE_STRF", Number;
        /// Delivery date in local time.
        DateReceived => "DATE_STRF_RECV_LOCAL", Number;
        /// Output of a named index-format hook.
        IndexHook => "INDEX_HOOK", String;
    }
}

fields! {
    /// The mailbox holding the message.
    MailboxField {
        /// Short mailbox name.
        Name => "NAME", String;
        /// Messages in the mailbox.
        MessageCount => "MESSAGE_COUNT", Number;
    }
}

/// Codes for `index_format`, `pager_format` and index-format hooks.
pub static INDEX_FORMAT: &[Definition] = &[
    PAD_SOFT,
    PAD_HARD,
    PAD_EOL,
    Definition::date("[", "date-strf-local", Field::Email(EmailField::DateLocal), ']', true),
    Definition::date("{", "date-strf", Field::Email(EmailField::DateSender), '}', false),
    Definition::date("(", "date-strf-recv-local", Field::Email(EmailField::DateReceived), ')', true),
    Definition::named("@", "index-hook", Field::Email(EmailField::IndexHook), '@'),
    Definition::new("a", "from", Field::Envelope(EnvelopeField::From)),
    Definition::new("A", "reply-to", Field::Envelope(EnvelopeField::ReplyTo)),
    Definition::new("b", "mailbox-name", Field::Mailbox(MailboxField::Name)),
    Definition::new("B", "list-address", Field::Envelope(EnvelopeField::ListAddress)),
    Definition::new("c", "size", Field::Email(EmailField::Size)),
    Definition::new("C", "number", Field::Email(EmailField::Number)),
    Definition::new("f", "from-full", Field::Envelope(EnvelopeField::FromFull)),
    Definition::new("Fp", "sender-plain", Field::Envelope(EnvelopeField::SenderPlain)),
    Definition::new("F", "sender", Field::Envelope(EnvelopeField::Sender)),
    Definition::new("g", "tags", Field::Email(EmailField::Tags)),
    Definition::new("H", "spam", Field::Envelope(EnvelopeField::Spam)),
    Definition::new("i", "message-id", Field::Envelope(EnvelopeField::MessageId)),
    Definition::new("I", "initials", Field::Envelope(EnvelopeField::Initials)),
    Definition::new("K", "list-empty", Field::Envelope(EnvelopeField::ListEmpty)),
    Definition::new("l", "lines", Field::Email(EmailField::Lines)),
    Definition::new("L", "from-list", Field::Envelope(EnvelopeField::ListOrFrom)),
    Definition::new("m", "message-count", Field::Mailbox(MailboxField::MessageCount)),
    Definition::new("n", "name", Field::Envelope(EnvelopeField::Name)),
    Definition::new("N", "score", Field::Email(EmailField::Score)),
    Definition::new("q", "newsgroup", Field::Envelope(EnvelopeField::Newsgroup)),
    Definition::new("r", "to-all", Field::Envelope(EnvelopeField::ToAll)),
    Definition::new("R", "cc-all", Field::Envelope(EnvelopeField::CcAll)),
    Definition::new("s", "subject", Field::Envelope(EnvelopeField::Subject)),
    Definition::new("S", "flag-chars", Field::Email(EmailField::StatusChar)),
    Definition::new("t", "to", Field::Envelope(EnvelopeField::To)),
    Definition::new("T", "to-chars", Field::Email(EmailField::ToChars)),
    Definition::new("u", "username", Field::Envelope(EnvelopeField::Username)),
    Definition::new("v", "first-name", Field::Envelope(EnvelopeField::FirstName)),
    Definition::new("W", "organization", Field::Envelope(EnvelopeField::Organization)),
    Definition::new("x", "x-comment-to", Field::Envelope(EnvelopeField::XCommentTo)),
    Definition::new("X", "attachment-count", Field::Email(EmailField::AttachCount)),
    Definition::new("y", "x-label", Field::Envelope(EnvelopeField::XLabel)),
    Definition::new("Z", "combined-flags", Field::Email(EmailField::CombinedFlags)),
    Definition::new("zc", "crypto-flags", Field::Email(EmailField::CryptoFlags)),
    Definition::new("zs", "status-flags", Field::Email(EmailField::StatusFlags)),
    Definition::new("zt", "message-flags", Field::Email(EmailField::MessageFlags)),
];

/// The mailbox a message is shown in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxInfo {
    /// Short name, e.g. `inbox`.
    pub name: String,
    /// Full path or URL.
    pub path: String,
    /// Messages in the mailbox.
    pub msg_count: usize,
}

/// Looks up and renders a named index-format hook.
pub type IndexHookFn<'a> = dyn Fn(&str, &Email) -> Option<String> + 'a;

/// Everything an index line can show about one message.
#[derive(Clone, Copy)]
pub struct IndexData<'a> {
    /// The message.
    pub email: &'a Email,
    /// The mailbox it lives in.
    pub mailbox: Option<&'a MailboxInfo>,
    /// Mailbox-wide knowledge: user addresses, lists.
    pub store: Option<&'a dyn MailStore>,
    /// Resolver for `%@name@`.
    pub index_hook: Option<&'a IndexHookFn<'a>>,
}

impl<'a> IndexData<'a> {
    /// Data for `email` with nothing else known.
    pub fn new(email: &'a Email) -> Self {
        Self {
            email,
            mailbox: None,
            store: None,
            index_hook: None,
        }
    }

    /// Attach the mailbox.
    pub fn with_mailbox(mut self, mailbox: &'a MailboxInfo) -> Self {
        self.mailbox = Some(mailbox);
        self
    }

    /// Attach the mail store.
    pub fn with_store(mut self, store: &'a dyn MailStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Attach the index-format hook resolver.
    pub fn with_index_hook(mut self, hook: &'a IndexHookFn<'a>) -> Self {
        self.index_hook = Some(hook);
        self
    }

    /// First author.
    fn from(&self) -> Option<&'a Address> {
        self.email.envelope.from.first()
    }

    /// Is `addr` one of the user's?
    fn is_user(&self, addr: &Address) -> bool {
        self.store.is_some_and(|s| s.is_user_address(addr))
    }

    /// First recipient that is a known mailing list.
    fn list_recipient(&self) -> Option<&'a Address> {
        let store = self.store?;
        self.email
            .envelope
            .recipients()
            .find(|a| store.is_mailing_list(a))
    }

    /// Display name of the author, or their mailbox.
    fn author_name(&self) -> String {
        self.from().map(display_name).unwrap_or_default()
    }

    /// The author, or the first recipient when the user wrote it.
    fn sender(&self, prefix: bool) -> String {
        if let Some(from) = self.from()
            && self.is_user(from)
            && let Some(to) = self.email.envelope.to.first()
        {
            let name = display_name(to);
            return if prefix { format!("To {name}") } else { name };
        }
        self.author_name()
    }

    /// The `to_chars` character for this message.
    fn to_char(&self) -> char {
        let env = &self.email.envelope;
        if self.from().is_some_and(|a| self.is_user(a)) {
            'F'
        } else if self.list_recipient().is_some() {
            'L'
        } else if env.to.len() == 1 && env.cc.is_empty() && self.is_user(&env.to[0]) {
            '+'
        } else if env.to.iter().any(|a| self.is_user(a)) {
            'T'
        } else if env.cc.iter().any(|a| self.is_user(a)) {
            'C'
        } else {
            ' '
        }
    }

    /// Deleted, new, old or replied.
    fn status_flag(&self) -> char {
        let f = &self.email.flags;
        if f.deleted {
            'D'
        } else if f.replied {
            'r'
        } else if self.email.is_new() {
            'N'
        } else if f.old && !f.read {
            'O'
        } else {
            ' '
        }
    }

    /// Signature and encryption state.
    fn crypto_flag(&self) -> char {
        let c = &self.email.crypt;
        if c.good_sign {
            'S'
        } else if c.encrypted {
            'P'
        } else if c.signed {
            's'
        } else if c.pgp_key {
            'K'
        } else {
            ' '
        }
    }

    /// Tagged, flagged, or how the user was addressed.
    fn message_flag(&self) -> char {
        let f = &self.email.flags;
        if f.tagged {
            '*'
        } else if f.flagged {
            '!'
        } else {
            self.to_char()
        }
    }

    /// The one-character summary used by `%S`.
    fn status_char(&self) -> char {
        let f = &self.email.flags;
        if f.deleted {
            'D'
        } else if f.tagged {
            '*'
        } else if f.flagged {
            '!'
        } else if f.replied {
            'r'
        } else if self.email.is_new() {
            'N'
        } else if f.old && !f.read {
            'O'
        } else {
            '-'
        }
    }

    /// Text for a header-derived field.
    fn envelope_string(&self, f: EnvelopeField) -> String {
        let env = &self.email.envelope;
        let opt = |s: &Option<String>| s.clone().unwrap_or_default();
        match f {
            EnvelopeField::From => self.from().map(|a| a.mailbox.clone()).unwrap_or_default(),
            EnvelopeField::ReplyTo => env
                .reply_to
                .first()
                .map(|a| a.mailbox.clone())
                .unwrap_or_default(),
            EnvelopeField::ListAddress => self
                .list_recipient()
                .map_or_else(|| self.author_name(), |a| a.local_part().to_string()),
            EnvelopeField::ListEmpty => self
                .list_recipient()
                .map(|a| a.local_part().to_string())
                .unwrap_or_default(),
            EnvelopeField::ListOrFrom => match self.list_recipient() {
                Some(list) => format!("To {}", list.local_part()),
                None => self.author_name(),
            },
            EnvelopeField::FromFull => env.from.to_string(),
            EnvelopeField::Sender => self.sender(true),
            EnvelopeField::SenderPlain => self.sender(false),
            EnvelopeField::Spam => opt(&env.spam),
            EnvelopeField::MessageId => opt(&env.message_id),
            EnvelopeField::Initials => initials(&self.author_name()),
            EnvelopeField::Name => self.author_name(),
            EnvelopeField::Newsgroup => opt(&env.newsgroups),
            EnvelopeField::ToAll => env.to.to_string(),
            EnvelopeField::CcAll => env.cc.to_string(),
            EnvelopeField::Subject => opt(&env.subject),
            EnvelopeField::To => env.to.first().map(display_name).unwrap_or_default(),
            EnvelopeField::Username => self
                .from()
                .map(|a| a.local_part().to_string())
                .unwrap_or_default(),
            EnvelopeField::FirstName => self
                .from()
                .map(|a| {
                    a.personal()
                        .and_then(|p| p.split_whitespace().next())
                        .unwrap_or_else(|| a.local_part())
                        .to_string()
                })
                .unwrap_or_default(),
            EnvelopeField::Organization => opt(&env.organization),
            EnvelopeField::XCommentTo => opt(&env.x_comment_to),
            EnvelopeField::XLabel => opt(&env.x_label),
        }
    }
}

/// Name if present, mailbox otherwise.
fn display_name(a: &Address) -> String {
    a.personal().unwrap_or(&a.mailbox).to_string()
}

/// First letter of each word of `name`.
fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|w| w.chars().find(|c| c.is_alphanumeric()))
        .collect()
}

/// Render a byte count the way the index shows sizes: `512`, `1.2K`, `34K`,
/// `5.6M`, `78M`.
pub fn pretty_size(bytes: u64) -> String {
    const K: u64 = 1024;
    const M: u64 = K * 1024;
    // Tenths are computed in integer arithmetic to avoid float rounding.
    if bytes < K {
        bytes.to_string()
    } else if bytes < 10 * K {
        let tenths = (bytes * 10 + K / 2) / K;
        format!("{}.{}K", tenths / 10, tenths % 10)
    } else if bytes < M {
        format!("{}K", (bytes + K / 2) / K)
    } else if bytes < 10 * M {
        let tenths = (bytes * 10 + M / 2) / M;
        format!("{}.{}M", tenths / 10, tenths % 10)
    } else {
        format!("{}M", (bytes + M / 2) / M)
    }
}

impl Provider for IndexData<'_> {
    fn string(&self, field: Field, _flags: RenderFlags) -> Option<String> {
        let e = self.email;
        match field {
            Field::Envelope(f) => Some(self.envelope_string(f)),
            Field::Email(f) => match f {
                EmailField::Size => Some(pretty_size(e.size)),
                EmailField::Tags => Some(e.tags.join(" ")),
                EmailField::StatusChar => Some(self.status_char().to_string()),
                EmailField::ToChars => Some(self.to_char().to_string()),
                EmailField::CombinedFlags => Some(
                    [self.status_flag(), self.crypto_flag(), self.message_flag()]
                        .iter()
                        .collect(),
                ),
                EmailField::CryptoFlags => Some(self.crypto_flag().to_string()),
                EmailField::StatusFlags => Some(self.status_flag().to_string()),
                EmailField::MessageFlags => Some(self.message_flag().to_string()),
                _ => None,
            },
            Field::Mailbox(MailboxField::Name) => self.mailbox.map(|m| m.name.clone()),
            _ => None,
        }
    }

    fn number(&self, field: Field, _flags: RenderFlags) -> Option<i64> {
        let e = self.email;
        let n = match field {
            Field::Email(f) => match f {
                EmailField::Size => i64::try_from(e.size).ok()?,
                EmailField::Number => i64::try_from(e.msgno()).ok()?,
                EmailField::Lines => i64::try_from(e.lines).ok()?,
                EmailField::Score => e.score,
                EmailField::AttachCount => i64::try_from(e.attach_count).ok()?,
                EmailField::DateLocal | EmailField::DateSender => e.date_sent,
                EmailField::DateReceived => e.received,
                EmailField::Tags => i64::from(!e.tags.is_empty()),
                _ => return None,
            },
            Field::Mailbox(MailboxField::MessageCount) => i64::try_from(self.mailbox?.msg_count).ok()?,
            _ => return None,
        };
        Some(n)
    }

    fn date(&self, field: Field) -> Option<DateTime<FixedOffset>> {
        match field {
            Field::Email(EmailField::DateLocal | EmailField::DateSender) => self.email.date(),
            Field::Email(EmailField::DateReceived) => self
                .email
                .received_date()
                .map(|d: DateTime<Utc>| d.fixed_offset()),
            _ => None,
        }
    }

    fn named(&self, field: Field, name: &str, _flags: RenderFlags) -> Option<String> {
        match field {
            Field::Email(EmailField::IndexHook) => (self.index_hook?)(name, self.email),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use maildata::{Envelope, MemStore};

    use super::*;

    fn email() -> Email {
        Email {
            envelope: Envelope {
                from: "Bob Smith <bob@x.org>".into(),
                to: "me@home.org".into(),
                cc: "dev@lists.org".into(),
                subject: Some("Hello".into()),
                ..Default::default()
            },
            size: 2048,
            ..Default::default()
        }
    }

    fn s(data: &IndexData<'_>, field: Field) -> String {
        data.string(field, RenderFlags::empty()).unwrap_or_default()
    }

    #[test]
    fn author_fields() {
        let e = email();
        let d = IndexData::new(&e);
        assert_eq!(s(&d, Field::Envelope(EnvelopeField::From)), "bob@x.org");
        assert_eq!(s(&d, Field::Envelope(EnvelopeField::Name)), "Bob Smith");
        assert_eq!(s(&d, Field::Envelope(EnvelopeField::Initials)), "BS");
        assert_eq!(s(&d, Field::Envelope(EnvelopeField::FirstName)), "Bob");
        assert_eq!(s(&d, Field::Envelope(EnvelopeField::Username)), "bob");
        assert_eq!(s(&d, Field::Email(EmailField::Size)), "2.0K");
    }

    #[test]
    fn store_aware_fields() {
        let e = email();
        let mut store = MemStore::new();
        store.add_user_address("me@home.org");
        store.lists.push("dev@lists.org".into());
        let d = IndexData::new(&e).with_store(&store);
        assert_eq!(s(&d, Field::Envelope(EnvelopeField::ListOrFrom)), "To dev");
        assert_eq!(s(&d, Field::Email(EmailField::ToChars)), "L");

        let mut mine = email();
        mine.envelope.from = "me@home.org".into();
        let d = IndexData::new(&mine).with_store(&store);
        assert_eq!(s(&d, Field::Envelope(EnvelopeField::Sender)), "To me@home.org");
        assert_eq!(s(&d, Field::Envelope(EnvelopeField::SenderPlain)), "me@home.org");
    }

    #[test]
    fn sizes() {
        assert_eq!(pretty_size(512), "512");
        assert_eq!(pretty_size(1229), "1.2K");
        assert_eq!(pretty_size(35_000), "34K");
        assert_eq!(pretty_size(5_872_026), "5.6M");
        assert_eq!(pretty_size(80_000_000), "76M");
    }

    #[test]
    fn flags_summary() {
        let mut e = email();
        e.flags.tagged = true;
        e.crypt.signed = true;
        let d = IndexData::new(&e);
        assert_eq!(s(&d, Field::Email(EmailField::CombinedFlags)), "Ns*");
        assert_eq!(s(&d, Field::Email(EmailField::StatusChar)), "*");
    }
}
