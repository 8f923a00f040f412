//! Envelopes and emails.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, AddressList};

/// Parsed header fields of a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelope {
    /// `From:`
    pub from: AddressList,
    /// `To:`
    pub to: AddressList,
    /// `Cc:`
    pub cc: AddressList,
    /// `Bcc:`
    pub bcc: AddressList,
    /// `Reply-To:`
    pub reply_to: AddressList,
    /// `Sender:`
    pub sender: AddressList,
    /// `Mail-Followup-To:`
    pub mail_followup_to: AddressList,
    /// `Subject:`
    pub subject: Option<String>,
    /// `Message-ID:`
    pub message_id: Option<String>,
    /// `References:` message ids, oldest first.
    pub references: Vec<String>,
    /// `In-Reply-To:` message ids.
    pub in_reply_to: Vec<String>,
    /// `X-Label:`
    pub x_label: Option<String>,
    /// `Newsgroups:`
    pub newsgroups: Option<String>,
    /// Spam attribute extracted by the spam rules.
    pub spam: Option<String>,
    /// `Organization:`
    pub organization: Option<String>,
    /// `X-Comment-To:`
    pub x_comment_to: Option<String>,
}

impl Envelope {
    /// Every address in the envelope, in header order.
    pub fn all_addresses(&self) -> impl Iterator<Item = &Address> {
        [
            &self.from,
            &self.sender,
            &self.reply_to,
            &self.to,
            &self.cc,
            &self.bcc,
            &self.mail_followup_to,
        ]
        .into_iter()
        .flat_map(|list| list.iter())
    }

    /// Addresses the message was sent to (`To:` and `Cc:`).
    pub fn recipients(&self) -> impl Iterator<Item = &Address> {
        self.to.iter().chain(self.cc.iter())
    }
}

/// Per-message status flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct Flags {
    pub read: bool,
    pub old: bool,
    pub deleted: bool,
    pub flagged: bool,
    pub replied: bool,
    pub tagged: bool,
    pub expired: bool,
    pub superseded: bool,
    pub collapsed: bool,
}

/// Security state recorded when the message was parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Crypt {
    /// Message is signed.
    pub signed: bool,
    /// Message is encrypted.
    pub encrypted: bool,
    /// Signature verified.
    pub good_sign: bool,
    /// Message contains a PGP key.
    pub pgp_key: bool,
}

/// Thread bookkeeping that the threading code attaches to a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadInfo {
    /// Another message in the mailbox has the same Message-ID.
    pub duplicate: bool,
    /// The thread was assembled from subjects rather than references.
    pub broken: bool,
    /// Messages hidden below this one when the thread is collapsed.
    pub hidden: usize,
}

/// A message as seen by the index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Email {
    /// Position in the mailbox, starting at zero.
    pub index: usize,
    /// Header fields.
    pub envelope: Envelope,
    /// `Date:` as seconds since the epoch.
    pub date_sent: i64,
    /// Sender's UTC offset in seconds east.
    pub zone_offset: i32,
    /// Delivery time as seconds since the epoch.
    pub received: i64,
    /// Body size in bytes.
    pub size: u64,
    /// Body lines.
    pub lines: u64,
    /// Score assigned by the scoring rules.
    pub score: i64,
    /// Number of MIME parts.
    pub attach_count: u64,
    /// Driver tags (notmuch, IMAP keywords).
    pub tags: Vec<String>,
    /// `type/subtype` of every MIME part.
    pub mime_types: Vec<String>,
    /// Status flags.
    pub flags: Flags,
    /// Security state.
    pub crypt: Crypt,
    /// Thread bookkeeping.
    pub thread: ThreadInfo,
}

impl Email {
    /// One-based message number.
    pub fn msgno(&self) -> usize {
        self.index + 1
    }

    /// Sent date in the sender's timezone.
    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.zone_offset).or_else(|| FixedOffset::east_opt(0))?;
        DateTime::from_timestamp(self.date_sent, 0).map(|d| d.with_timezone(&offset))
    }

    /// Delivery date in UTC.
    pub fn received_date(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.received, 0)
    }

    /// Is the message new, i.e. neither read nor seen before?
    pub fn is_new(&self) -> bool {
        !self.flags.old && !self.flags.read
    }
}
